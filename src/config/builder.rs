// src/config/builder.rs

use super::{
    builder_logic::{determine_extractor, determine_output_destination, validate_builder_options},
    parsing::{parse_encoding, parse_max_size, parse_ratio},
    ArchiveConfig, CacheConfig, Config, DiscoveryConfig, ProcessingConfig,
};
use crate::cli::Cli;
use crate::constants::{
    DEFAULT_BINARY_RATIO, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_ARCHIVE_DEPTH,
    DEFAULT_MAX_ARCHIVE_SIZE, DEFAULT_MAX_FILE_SIZE, DEFAULT_SAMPLE_SIZE,
};
use crate::errors::{Error, Result};
use crate::processing::extract::ContentExtractor;
use std::path::PathBuf;
use std::sync::Arc;

/// A fluent builder for [`Config`].
///
/// Every setting is optional; unset settings take their documented default.
/// Textual settings (sizes, encoding labels) are parsed and validated by
/// [`build`](ConfigBuilder::build).
///
/// # Examples
/// ```
/// use foldcat::config::ConfigBuilder;
///
/// # fn main() -> Result<(), foldcat::Error> {
/// let config = ConfigBuilder::new()
///     .input_path("src")
///     .max_file_size("256k")
///     .encoding("latin1")
///     .extract_content(true)
///     .build()?;
/// assert_eq!(config.processing.max_file_size, 256_000);
/// assert_eq!(config.processing.extractor.name(), "condensed");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    pub(super) input_path: Option<String>,
    pub(super) recursive: Option<bool>,
    pub(super) use_gitignore: Option<bool>,
    pub(super) ignore_patterns: Option<Vec<String>>,
    pub(super) max_file_size: Option<String>,
    pub(super) sample_size: Option<usize>,
    pub(super) binary_ratio: Option<f32>,
    pub(super) encoding: Option<String>,
    pub(super) extract_content: Option<bool>,
    pub(super) extractor: Option<Arc<dyn ContentExtractor>>,
    pub(super) expand_archives: Option<bool>,
    pub(super) max_archive_depth: Option<usize>,
    pub(super) max_archive_size: Option<String>,
    pub(super) cache_capacity: Option<usize>,
    pub(super) cache_dir: Option<PathBuf>,
    pub(super) output_file: Option<String>,
    #[cfg(feature = "clipboard")]
    pub(super) paste: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from parsed command-line arguments.
    ///
    /// Unlike the library default, the CLI persists cache entries in the
    /// platform cache directory unless `--cache-dir` names another one.
    /// `--no-cache` stops the cache from being used but keeps the directory
    /// known so `--clear-cache` can still empty it.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut builder = Self::new()
            .input_path(cli.input_path.clone())
            .recursive(!cli.no_recursive)
            .use_gitignore(!cli.no_gitignore)
            .extract_content(cli.extract_content)
            .expand_archives(!cli.no_archives);

        builder.ignore_patterns = cli.ignore_patterns.clone();
        builder.max_file_size = cli.max_size.clone();
        builder.sample_size = cli.sample_size;
        builder.binary_ratio = cli.binary_ratio;
        builder.encoding = cli.encoding.clone();
        builder.max_archive_depth = cli.max_archive_depth;
        builder.max_archive_size = cli.max_archive_size.clone();
        builder.cache_capacity = cli.cache_capacity;
        builder.output_file = cli.output_file.clone();
        #[cfg(feature = "clipboard")]
        {
            builder.paste = Some(cli.paste);
        }

        if cli.no_cache {
            builder.cache_capacity = Some(0);
        }
        builder.cache_dir = cli.cache_dir.clone().or_else(crate::cache::default_cache_dir);
        builder
    }

    pub fn input_path(mut self, path: impl Into<String>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Recurse into subdirectories (default `true`).
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// Honor `.gitignore` and friends (default `true`).
    pub fn use_gitignore(mut self, use_gitignore: bool) -> Self {
        self.use_gitignore = Some(use_gitignore);
        self
    }

    /// Custom ignore globs, relative to the selection root.
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = Some(patterns);
        self
    }

    /// Size threshold as a human string, e.g. `"1MiB"` or `"512k"`.
    pub fn max_file_size(mut self, size: impl Into<String>) -> Self {
        self.max_file_size = Some(size.into());
        self
    }

    pub fn sample_size(mut self, bytes: usize) -> Self {
        self.sample_size = Some(bytes);
        self
    }

    pub fn binary_ratio(mut self, ratio: f32) -> Self {
        self.binary_ratio = Some(ratio);
        self
    }

    /// Fallback encoding label for content that is not UTF-8.
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Selects the condensed extract strategy when `true`.
    pub fn extract_content(mut self, extract: bool) -> Self {
        self.extract_content = Some(extract);
        self
    }

    /// Supplies a custom extract strategy. Overrides `extract_content`.
    pub fn extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn expand_archives(mut self, expand: bool) -> Self {
        self.expand_archives = Some(expand);
        self
    }

    pub fn max_archive_depth(mut self, depth: usize) -> Self {
        self.max_archive_depth = Some(depth);
        self
    }

    /// Largest archive that is expanded, as a human string like `"64MiB"`.
    pub fn max_archive_size(mut self, size: impl Into<String>) -> Self {
        self.max_archive_size = Some(size.into());
        self
    }

    /// Number of cached results. `0` disables caching.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Persist cache entries under `dir`.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    #[cfg(feature = "clipboard")]
    pub fn paste(mut self, paste: bool) -> Self {
        self.paste = Some(paste);
        self
    }

    /// Validates the settings and produces a [`Config`].
    ///
    /// # Errors
    /// Returns [`Error::Config`] for unparsable sizes, unknown encoding
    /// labels, out-of-range values, and conflicting options.
    pub fn build(self) -> Result<Config> {
        validate_builder_options(&self)?;

        let max_file_size = self
            .max_file_size
            .as_deref()
            .map(parse_max_size)
            .transpose()
            .map_err(config_error)?
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);
        let max_archive_size = self
            .max_archive_size
            .as_deref()
            .map(parse_max_size)
            .transpose()
            .map_err(config_error)?
            .unwrap_or(DEFAULT_MAX_ARCHIVE_SIZE);
        let binary_ratio = self
            .binary_ratio
            .map(parse_ratio)
            .transpose()
            .map_err(config_error)?
            .unwrap_or(DEFAULT_BINARY_RATIO);
        let fallback_encoding = self
            .encoding
            .as_deref()
            .map(parse_encoding)
            .transpose()
            .map_err(config_error)?;
        let extract_content = self.extract_content.unwrap_or(false);

        let config = Config {
            input_path: self.input_path.unwrap_or_else(|| ".".to_string()),
            discovery: DiscoveryConfig {
                recursive: self.recursive.unwrap_or(true),
                use_gitignore: self.use_gitignore.unwrap_or(true),
                ignore_patterns: self.ignore_patterns,
            },
            processing: ProcessingConfig {
                max_file_size,
                sample_size: self.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE),
                binary_ratio,
                fallback_encoding,
                extract_content,
                extractor: determine_extractor(self.extractor, extract_content),
            },
            archive: ArchiveConfig {
                expand_archives: self.expand_archives.unwrap_or(true),
                max_depth: self.max_archive_depth.unwrap_or(DEFAULT_MAX_ARCHIVE_DEPTH),
                max_archive_size,
            },
            cache: CacheConfig {
                capacity: self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
                directory: self.cache_dir,
            },
            output_destination: determine_output_destination(
                self.output_file,
                #[cfg(feature = "clipboard")]
                self.paste,
            ),
        };
        log::debug!("Built configuration: {:?}", config);
        Ok(config)
    }
}

fn config_error(err: anyhow::Error) -> Error {
    Error::Config(format!("{:#}", err))
}
