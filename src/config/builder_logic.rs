// src/config/builder_logic.rs

use super::{ConfigBuilder, OutputDestination};
use crate::errors::{Error, Result};
use crate::processing::extract::{default_extractor, ContentExtractor};
use std::path::PathBuf;
use std::sync::Arc;

/// Validates combinations of options on the `ConfigBuilder`.
pub(super) fn validate_builder_options(builder: &ConfigBuilder) -> Result<()> {
    #[cfg(feature = "clipboard")]
    {
        if builder.output_file.is_some() && builder.paste.unwrap_or(false) {
            return Err(Error::Config(
                "'--output' cannot be used with '--paste'".to_string(),
            ));
        }
    }
    if builder.sample_size == Some(0) {
        return Err(Error::Config(
            "'--sample-size' must be greater than zero".to_string(),
        ));
    }
    if builder.max_archive_depth == Some(0) && builder.expand_archives.unwrap_or(true) {
        return Err(Error::Config(
            "'--max-archive-depth' must be at least 1 (use '--no-archives' to disable expansion)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Picks the extract strategy: an explicitly supplied one wins over the flag.
pub(super) fn determine_extractor(
    extractor: Option<Arc<dyn ContentExtractor>>,
    extract_content: bool,
) -> Arc<dyn ContentExtractor> {
    extractor.unwrap_or_else(|| default_extractor(extract_content))
}

/// Determines the final output destination.
pub(super) fn determine_output_destination(
    output_file: Option<String>,
    #[cfg(feature = "clipboard")] paste: Option<bool>,
) -> OutputDestination {
    if let Some(file_path_str) = output_file {
        OutputDestination::File(PathBuf::from(file_path_str))
    } else {
        #[cfg(feature = "clipboard")]
        if paste.unwrap_or(false) {
            OutputDestination::Clipboard
        } else {
            OutputDestination::Stdout
        }
        #[cfg(not(feature = "clipboard"))]
        {
            OutputDestination::Stdout
        }
    }
}
