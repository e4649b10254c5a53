// src/constants.rs

/// Files larger than this are classified as binary without being read.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Number of leading bytes inspected by the text/binary classifier.
pub const DEFAULT_SAMPLE_SIZE: usize = 8 * 1024;

/// Share of non-printable control bytes in the sample above which content is binary.
pub const DEFAULT_BINARY_RATIO: f32 = 0.30;

/// How many archives may be nested inside one another before expansion stops.
pub const DEFAULT_MAX_ARCHIVE_DEPTH: usize = 4;

/// Number of recent results kept by the result cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Prefix of the header line that opens every file block in the document.
pub const FILE_HEADER_PREFIX: &str = "## File: ";

/// Shortest code fence used around file content.
pub const MIN_FENCE_TICKS: usize = 3;

/// File extensions expanded as ZIP archives (compared case-insensitively).
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// Separator used before the summary section.
pub const SUMMARY_SEPARATOR: &str = "---";

/// Prefix for the summary header line.
pub const SUMMARY_HEADER_PREFIX: &str = "Processed Files";

/// Application name used for the platform cache directory.
pub const APP_NAME: &str = "foldcat";

/// Largest archive that is expanded, at any nesting level. An archive is held
/// in memory while its members are expanded; larger ones are left unexpanded.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 64 * 1024 * 1024;

/// Archive members decompressed before the batch is processed. Bounds the
/// member bytes held at once per nesting level.
pub const ARCHIVE_MEMBER_BATCH: usize = 64;
