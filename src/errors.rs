//! Defines the library error type and the per-entry issue log.
//!
//! Two kinds of failure exist in a run. An [`Error`] aborts the operation it
//! was returned from. An [`Issue`] is a problem with a single entry that was
//! recorded and skipped so the rest of the selection could still be ingested.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A specialized `Result` type for `foldcat` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the `foldcat` library.
#[derive(Error, Debug)]
pub enum Error {
    // --- I/O Errors ---
    /// Error occurring during file or directory access.
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        /// The path that caused the I/O error.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// The root of the selection could not be read. This is the only error
    /// that moves a run to the `Failed` state.
    #[error("Cannot read selection root '{path}': {source}")]
    RootUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A single entry could not be read.
    #[error("Cannot read '{path}': {source}")]
    EntryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An archive (or archive member) could not be decoded.
    #[error("Archive '{path}' is corrupt: {reason}")]
    ArchiveCorrupt { path: String, reason: String },

    /// Nested archives went deeper than the configured bound.
    #[error("Archive '{path}' is nested {depth} levels deep, exceeding the limit")]
    ArchiveDepthExceeded { path: String, depth: usize },

    /// A persisted cache blob could not be used. Callers treat this as a miss.
    #[error("Cache entry '{path}' is unusable: {reason}")]
    CacheCorrupt { path: String, reason: String },

    // --- Configuration Errors ---
    /// Invalid configuration setting or combination.
    #[error("Invalid configuration: {0}")]
    Config(String),

    // --- Session Errors ---
    /// The run was cancelled; previously published state is retained.
    #[error("Operation cancelled")]
    Interrupted,

    /// An ingestion run is active, so the requested mutation was rejected.
    #[error("An ingestion run is in progress")]
    Busy,

    /// No tree has been published yet.
    #[error("Nothing has been ingested yet")]
    NothingPublished,

    /// The requested path does not exist in the published tree.
    #[error("No node at path '{0}'")]
    UnknownPath(String),

    /// The requested path exists but has no text content (binary, failed, or a directory).
    #[error("'{0}' has no text content")]
    NotAFile(String),

    // --- Clipboard Errors ---
    #[cfg(feature = "clipboard")]
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Errors that can occur during clipboard operations.
#[cfg(feature = "clipboard")]
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Failed to initialize clipboard backend: {0}")]
    Initialization(String),
    #[error("Failed to set clipboard content: {0}")]
    SetContent(String),
}

/// Helper function to create an `Error::Io` with path context.
pub fn io_error_with_path<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Io {
        path: path.as_ref().display().to_string(),
        source,
    }
}

/// The category of a recorded per-entry issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// The entry's bytes could not be read. The entry is marked failed.
    EntryRead,
    /// An archive or archive member could not be decoded.
    ArchiveCorrupt,
    /// An archive was nested beyond `max_archive_depth`.
    ArchiveDepthExceeded,
    /// An archive member carried an unsafe path (absolute or `..`).
    UnsafePath,
    /// A path was used by both a file and a directory.
    PathConflict,
    /// Text was decoded lossily. The content is still included.
    DecodeWarning,
    /// The entry exceeded the size threshold and was treated as binary.
    SizeLimitExceeded,
}

impl IssueKind {
    /// Whether the affected entry was dropped from the document entirely
    /// (as opposed to a warning on content that is still included).
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            IssueKind::EntryRead
                | IssueKind::ArchiveCorrupt
                | IssueKind::ArchiveDepthExceeded
                | IssueKind::UnsafePath
                | IssueKind::PathConflict
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::EntryRead => "read error",
            IssueKind::ArchiveCorrupt => "corrupt archive",
            IssueKind::ArchiveDepthExceeded => "archive too deep",
            IssueKind::UnsafePath => "unsafe path",
            IssueKind::PathConflict => "path conflict",
            IssueKind::DecodeWarning => "lossy decode",
            IssueKind::SizeLimitExceeded => "over size limit",
        };
        f.write_str(label)
    }
}

/// A problem with one entry that was recorded instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Full path of the affected entry.
    pub path: String,
    pub kind: IssueKind,
    /// Human readable detail.
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Builds an issue from an error that was caught at entry granularity.
    pub fn from_error(path: impl Into<String>, err: &Error) -> Self {
        let kind = match err {
            Error::ArchiveCorrupt { .. } => IssueKind::ArchiveCorrupt,
            Error::ArchiveDepthExceeded { .. } => IssueKind::ArchiveDepthExceeded,
            _ => IssueKind::EntryRead,
        };
        Self::new(path, kind, err.to_string())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, path::PathBuf};

    #[test]
    fn test_io_error_with_path_helper() {
        let path = PathBuf::from("some/test/path.txt");
        let source_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err = io_error_with_path(source_error, &path);

        match err {
            Error::Io {
                path: error_path,
                source,
            } => {
                assert!(error_path.contains("some/test/path.txt"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Error::Io"),
        }
    }

    #[test]
    fn test_issue_from_archive_error_keeps_category() {
        let err = Error::ArchiveCorrupt {
            path: "bundle.zip".to_string(),
            reason: "invalid Zip archive".to_string(),
        };
        let issue = Issue::from_error("bundle.zip", &err);
        assert_eq!(issue.kind, IssueKind::ArchiveCorrupt);
        assert!(issue.kind.is_failure());
        assert!(issue.message.contains("invalid Zip archive"));
    }

    #[test]
    fn test_decode_warning_is_not_a_failure() {
        assert!(!IssueKind::DecodeWarning.is_failure());
        assert!(!IssueKind::SizeLimitExceeded.is_failure());
    }
}
