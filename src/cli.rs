// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Folds a folder, or a set of files and ZIP archives, into one navigable text document.
///
/// foldcat walks the selection (respecting .gitignore rules), expands ZIP archives
/// recursively, classifies every file as text or binary, and concatenates all text
/// into a single Markdown-style document with one delimited block per file. Results
/// are cached by selection signature, so re-running on an unchanged folder is instant.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the directory or file to ingest.
    #[arg(default_value = ".")]
    pub input_path: String,

    // --- Discovery Options ---
    /// Do not recurse into subdirectories.
    #[arg(short = 'n', long, action = clap::ArgAction::SetTrue)]
    pub no_recursive: bool,

    /// Ignore files/directories matching these glob patterns (relative to input path, repeatable).
    #[arg(short = 'i', long = "ignore", value_name = "GLOB", num_args = 1..)]
    pub ignore_patterns: Option<Vec<String>>,

    /// Do not respect .gitignore, .ignore, or other VCS ignore files.
    #[arg(short = 't', long, action = clap::ArgAction::SetTrue)]
    pub no_gitignore: bool,

    // --- Classification Options ---
    /// Files larger than this (e.g., "1M", "512k") are treated as binary without being read.
    #[arg(short = 'm', long, value_name = "BYTES")]
    pub max_size: Option<String>,

    /// Number of leading bytes inspected when deciding text vs. binary.
    #[arg(long, value_name = "BYTES")]
    pub sample_size: Option<usize>,

    /// Share of control bytes (0.0 to 1.0) above which a file is binary.
    #[arg(long, value_name = "RATIO")]
    pub binary_ratio: Option<f32>,

    /// Decode non-UTF-8 files with this encoding (e.g., "latin1", "shift_jis").
    #[arg(long, value_name = "LABEL")]
    pub encoding: Option<String>,

    // --- Archive Options ---
    /// Treat ZIP archives as ordinary binary files instead of expanding them.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_archives: bool,

    /// How many archives may be nested inside one another.
    #[arg(long, value_name = "DEPTH")]
    pub max_archive_depth: Option<usize>,

    /// Leave archives larger than this unexpanded (e.g., "64M", "1G").
    #[arg(long, value_name = "BYTES")]
    pub max_archive_size: Option<String>,

    // --- Content Options ---
    /// Condense content: strip C-style comments and blank lines.
    #[arg(short = 'x', long = "extract", action = clap::ArgAction::SetTrue)]
    pub extract_content: bool,

    // --- Output Destination & Summary ---
    /// Write the document to the specified file instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output_file: Option<String>,

    #[cfg(feature = "clipboard")]
    /// Copy the document to the system clipboard.
    #[arg(short = 'p', long, action = clap::ArgAction::SetTrue)]
    pub paste: bool,

    /// Print a status summary (counts and issues) to stderr.
    #[arg(short = 's', long, action = clap::ArgAction::SetTrue)]
    pub summary: bool,

    /// Print the ingested file tree to stderr.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub tree: bool,

    // --- Cache Options ---
    /// Do not read or write the result cache.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Directory for persisted cache entries (defaults to the platform cache directory).
    #[arg(long, value_name = "PATH", conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Number of results kept in the cache.
    #[arg(long, value_name = "COUNT")]
    pub cache_capacity: Option<usize>,

    /// Remove all cached results before running.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub clear_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["foldcat"]);
        assert_eq!(cli.input_path, ".");
        assert!(!cli.no_recursive);
        assert!(!cli.extract_content);
        assert!(cli.ignore_patterns.is_none());
        assert!(cli.max_size.is_none());
    }

    #[test]
    fn test_repeatable_ignore() {
        let cli = Cli::parse_from(["foldcat", "src", "-i", "*.log", "target/*"]);
        assert_eq!(cli.input_path, "src");
        assert_eq!(
            cli.ignore_patterns,
            Some(vec!["*.log".to_string(), "target/*".to_string()])
        );
    }

    #[test]
    fn test_no_cache_conflicts_with_cache_dir() {
        let result = Cli::try_parse_from(["foldcat", "--no-cache", "--cache-dir", "/tmp/x"]);
        assert!(result.is_err());
    }
}
