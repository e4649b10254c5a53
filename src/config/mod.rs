//! Defines the core `Config` struct and related types for application configuration.
//!
//! Settings are grouped by pipeline stage. Only the processing and archive
//! groups influence what a run produces, so only they feed
//! [`Config::fingerprint`], which is folded into the cache signature.

use crate::constants::{
    DEFAULT_BINARY_RATIO, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_ARCHIVE_DEPTH,
    DEFAULT_MAX_ARCHIVE_SIZE, DEFAULT_MAX_FILE_SIZE, DEFAULT_SAMPLE_SIZE,
};
use crate::processing::classify::ClassifyLimits;
use crate::processing::extract::{default_extractor, ContentExtractor};
use encoding_rs::Encoding;
use std::path::PathBuf;
use std::sync::Arc;

pub use builder::ConfigBuilder;
mod builder;
mod builder_logic;
mod parsing;

/// Configuration options related to walking a folder selection.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Whether to respect `.gitignore`, `.ignore`, and other VCS ignore files.
    pub use_gitignore: bool,
    /// Custom ignore globs, matched against paths relative to the root.
    pub ignore_patterns: Option<Vec<String>>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            use_gitignore: true,
            ignore_patterns: None,
        }
    }
}

/// Configuration options related to classifying and decoding content.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Files above this size are `Oversized`; their bytes are never read.
    pub max_file_size: u64,
    /// Leading bytes inspected by the classifier.
    pub sample_size: usize,
    /// Control byte share above which content is binary.
    pub binary_ratio: f32,
    /// Declared encoding for content that is neither UTF-8 nor BOM-marked.
    /// When `None`, such content is left undecoded.
    pub fallback_encoding: Option<&'static Encoding>,
    /// Whether the condensed extract strategy is selected.
    pub extract_content: bool,
    /// The extract strategy applied to decoded text.
    pub extractor: Arc<dyn ContentExtractor>,
}

impl ProcessingConfig {
    pub fn limits(&self) -> ClassifyLimits {
        ClassifyLimits {
            max_file_size: self.max_file_size,
            sample_size: self.sample_size,
            binary_ratio: self.binary_ratio,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            binary_ratio: DEFAULT_BINARY_RATIO,
            fallback_encoding: None,
            extract_content: false,
            extractor: default_extractor(false),
        }
    }
}

/// Configuration options related to archive expansion.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveConfig {
    /// When `false`, archives are ordinary (binary) files.
    pub expand_archives: bool,
    /// Maximum nesting depth. A top-level archive has depth 1.
    pub max_depth: usize,
    /// Archives larger than this are not expanded.
    pub max_archive_size: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            expand_archives: true,
            max_depth: DEFAULT_MAX_ARCHIVE_DEPTH,
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
        }
    }
}

/// Configuration options related to the result cache.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Number of results kept. `0` disables caching.
    pub capacity: usize,
    /// Directory for persisted entries. `None` keeps the cache in memory only.
    pub directory: Option<PathBuf>,
}

/// Represents the destination for the generated document.
#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum OutputDestination {
    /// Write to standard output.
    Stdout,
    /// Write to the specified file path.
    File(PathBuf),
    #[cfg(feature = "clipboard")]
    /// Copy the output to the system clipboard (requires the `clipboard` feature).
    Clipboard,
}

/// Represents the complete, validated configuration for a session.
#[derive(Debug, Clone)]
pub struct Config {
    /// The path of the folder or file to ingest, as given.
    pub input_path: String,
    pub discovery: DiscoveryConfig,
    pub processing: ProcessingConfig,
    pub archive: ArchiveConfig,
    pub cache: CacheConfig,
    /// Where the CLI delivers the document.
    pub output_destination: OutputDestination,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: ".".to_string(),
            discovery: DiscoveryConfig::default(),
            processing: ProcessingConfig::default(),
            archive: ArchiveConfig::default(),
            cache: CacheConfig {
                capacity: DEFAULT_CACHE_CAPACITY,
                directory: None,
            },
            output_destination: OutputDestination::Stdout,
        }
    }
}

impl Config {
    /// A stable string describing every setting that changes what a run
    /// produces from the same entries.
    pub fn fingerprint(&self) -> String {
        let p = &self.processing;
        format!(
            "max={};sample={};ratio={};enc={};extract={};archives={};depth={};archive_max={}",
            p.max_file_size,
            p.sample_size,
            p.binary_ratio,
            p.fallback_encoding.map_or("none", |e| e.name()),
            p.extractor.name(),
            self.archive.expand_archives,
            self.archive.max_depth,
            self.archive.max_archive_size,
        )
    }
}
