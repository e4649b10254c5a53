//! Pluggable content extraction applied to decoded text before assembly.
//!
//! Extraction is a named strategy. The `extract_content` setting picks between
//! the two built-in policies: [`FullContent`] passes text through unchanged,
//! [`CondensedContent`] strips blank lines, and comments in C-family sources,
//! so more files fit in the same document. Other strategies can be supplied through
//! [`ConfigBuilder::extractor`](crate::config::ConfigBuilder::extractor).

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

mod comments;

pub use comments::strip_comments;

/// A content reduction strategy.
pub trait ContentExtractor: Send + Sync {
    /// Reduces (or passes through) one file's decoded text.
    fn extract(&self, path: &str, content: &str) -> String;
    /// Stable name used in configuration and in the cache signature.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn ContentExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentExtractor").field(&self.name()).finish()
    }
}

/// Includes every file verbatim.
#[derive(Debug, Default)]
pub struct FullContent;

impl ContentExtractor for FullContent {
    fn extract(&self, _path: &str, content: &str) -> String {
        content.to_string()
    }
    fn name(&self) -> &'static str {
        "full"
    }
}

/// Extensions whose sources use `//` and `/* */` comments.
const C_FAMILY_EXTENSIONS: &[&str] = &[
    "c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "m", "mm", "cs", "java", "kt", "kts",
    "scala", "groovy", "js", "mjs", "cjs", "jsx", "ts", "tsx", "rs", "go", "swift", "dart",
    "php", "css", "scss", "less", "proto",
];

/// Whether `path` names a source file with C-style comments.
pub fn has_c_style_comments(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            C_FAMILY_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Drops whitespace-only lines, and C-style comments in files that use them.
#[derive(Debug, Default)]
pub struct CondensedContent;

impl ContentExtractor for CondensedContent {
    fn extract(&self, path: &str, content: &str) -> String {
        if has_c_style_comments(path) {
            remove_blank_lines(&strip_comments(content))
        } else {
            remove_blank_lines(content)
        }
    }
    fn name(&self) -> &'static str {
        "condensed"
    }
}

/// Removes lines containing only whitespace.
///
/// # Examples
/// ```
/// use foldcat::processing::extract::remove_blank_lines;
///
/// assert_eq!(remove_blank_lines("a\n\n  \t\nb"), "a\nb");
/// ```
pub fn remove_blank_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

static REGISTRY: Lazy<BTreeMap<&'static str, Arc<dyn ContentExtractor>>> = Lazy::new(|| {
    let strategies: [Arc<dyn ContentExtractor>; 2] =
        [Arc::new(FullContent), Arc::new(CondensedContent)];
    strategies.into_iter().map(|s| (s.name(), s)).collect()
});

/// Looks up a built-in strategy by name.
pub fn extractor_by_name(name: &str) -> Option<Arc<dyn ContentExtractor>> {
    REGISTRY.get(name).cloned()
}

/// Names of all built-in strategies.
pub fn extractor_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

/// The strategy selected by the boolean `extract_content` setting.
pub fn default_extractor(extract_content: bool) -> Arc<dyn ContentExtractor> {
    if extract_content {
        Arc::new(CondensedContent)
    } else {
        Arc::new(FullContent)
    }
}
