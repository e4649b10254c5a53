//! Turns a user's selection into a flat list of [`Entry`] values.
//!
//! A selection is either a folder (or single file) on disk, walked by
//! [`FsSelection`], or a set of dropped items held in memory by
//! [`MemorySelection`]. Neither reads file content up front: every file entry
//! carries a [`ByteProvider`] that is asked for bytes only when the leaf is
//! processed.

use crate::cancellation::CancellationToken;
use crate::constants::ARCHIVE_EXTENSIONS;
use crate::errors::Result;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

mod signature;
mod walker;

pub use signature::Signature;
pub use walker::FsSelection;

/// What an [`Entry`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// A file produced by expanding an archive.
    ArchiveMember,
}

impl EntryKind {
    fn tag(self) -> &'static str {
        match self {
            EntryKind::File => "f",
            EntryKind::Directory => "d",
            EntryKind::ArchiveMember => "m",
        }
    }
}

/// Lazy access to the bytes of one entry.
pub trait ByteProvider: Send + Sync + fmt::Debug {
    /// Declared size in bytes. May be a lie for archive members; readers must
    /// still honor the limit passed to [`read_bounded`](Self::read_bounded).
    fn size(&self) -> u64;

    /// Reads at most `limit` bytes from the start of the content.
    fn read_bounded(&self, limit: u64) -> io::Result<Vec<u8>>;

    /// Cheap change detector folded into the selection [`Signature`].
    fn fingerprint(&self) -> String;
}

/// A file on disk. Fingerprinted by size and modification time.
#[derive(Debug, Clone)]
pub struct FsFile {
    path: PathBuf,
    size: u64,
    modified: Option<SystemTime>,
}

impl FsFile {
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }

    /// Builds the provider from the file's current metadata.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(
            path.to_path_buf(),
            metadata.len(),
            metadata.modified().ok(),
        ))
    }
}

impl ByteProvider for FsFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_bounded(&self, limit: u64) -> io::Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        let mut buffer = Vec::with_capacity(self.size.min(limit) as usize);
        file.take(limit).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn fingerprint(&self) -> String {
        let mtime = self
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("{}:{}", self.size, mtime)
    }
}

/// Bytes already held in memory, such as a dropped file or a decompressed
/// archive member. Fingerprinted by a SHA-256 of the content.
pub struct InMemory {
    bytes: Arc<[u8]>,
    digest: OnceCell<String>,
}

impl InMemory {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            digest: OnceCell::new(),
        }
    }
}

impl fmt::Debug for InMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemory")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ByteProvider for InMemory {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bounded(&self, limit: u64) -> io::Result<Vec<u8>> {
        let end = self.bytes.len().min(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(self.bytes[..end].to_vec())
    }

    fn fingerprint(&self) -> String {
        self.digest
            .get_or_init(|| hex::encode(Sha256::digest(&self.bytes[..])))
            .clone()
    }
}

/// One item of a selection: a file, a directory, or an archive member.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Slash-separated path relative to the selection root.
    pub path: String,
    pub kind: EntryKind,
    /// Full path of the archive this entry was expanded from.
    pub source_archive: Option<String>,
    provider: Option<Arc<dyn ByteProvider>>,
}

impl Entry {
    pub fn file(path: impl AsRef<str>, provider: Arc<dyn ByteProvider>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            kind: EntryKind::File,
            source_archive: None,
            provider: Some(provider),
        }
    }

    pub fn directory(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            kind: EntryKind::Directory,
            source_archive: None,
            provider: None,
        }
    }

    /// A member of `archive` at `inner` (the member's path inside the archive).
    pub fn archive_member(archive: &str, inner: &str, provider: Arc<dyn ByteProvider>) -> Self {
        Self {
            path: normalize_path(&format!("{}/{}", archive, inner)),
            kind: EntryKind::ArchiveMember,
            source_archive: Some(archive.to_string()),
            provider: Some(provider),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Whether the entry is recognized as an expandable archive by extension.
    pub fn is_archive(&self) -> bool {
        !self.is_dir() && is_archive_path(&self.path)
    }

    pub fn size(&self) -> u64 {
        self.provider.as_ref().map_or(0, |p| p.size())
    }

    /// Reads at most `limit` bytes. Directories have no content.
    pub fn read_bounded(&self, limit: u64) -> io::Result<Vec<u8>> {
        match &self.provider {
            Some(provider) => provider.read_bounded(limit),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is a directory", self.path),
            )),
        }
    }

    pub fn fingerprint(&self) -> String {
        self.provider
            .as_ref()
            .map_or_else(String::new, |p| p.fingerprint())
    }

    /// Stable text used when hashing the selection.
    pub(crate) fn signature_line(&self) -> String {
        format!("{}\t{}\t{}", self.kind.tag(), self.path, self.fingerprint())
    }
}

/// Checks the extension of `path` against the known archive formats.
pub fn is_archive_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Normalizes a user or archive supplied path to the canonical form used as a
/// tree key.
///
/// Backslashes become `/`; empty, `.` and `..` segments are dropped, which
/// also removes any leading `./` or `/`.
///
/// # Examples
/// ```
/// use foldcat::selection::normalize_path;
///
/// assert_eq!(normalize_path("./src\\lib.rs"), "src/lib.rs");
/// assert_eq!(normalize_path("/a//b/"), "a/b");
/// ```
pub fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// A source of entries.
pub trait Selection: Send + Sync {
    /// Short human readable description, used in logs.
    fn label(&self) -> String;

    /// Enumerates every entry of the selection, sorted by path.
    ///
    /// # Errors
    /// [`Error::RootUnreadable`](crate::Error::RootUnreadable) if the root
    /// itself cannot be read, and [`Error::Interrupted`](crate::Error::Interrupted)
    /// if `token` is cancelled during the walk.
    fn entries(&self, token: &CancellationToken) -> Result<Vec<Entry>>;
}

/// Dropped items held in memory, given as `(path, bytes)` pairs.
///
/// # Examples
/// ```
/// use foldcat::selection::{MemorySelection, Selection};
/// use foldcat::CancellationToken;
///
/// let selection = MemorySelection::new("drop")
///     .with_file("notes/todo.txt", b"buy milk".to_vec())
///     .with_file("readme.md", b"# hi".to_vec());
/// let entries = selection.entries(&CancellationToken::new()).unwrap();
/// assert_eq!(entries[0].path, "notes/todo.txt");
/// assert_eq!(entries.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySelection {
    label: String,
    files: Vec<(String, Arc<[u8]>)>,
}

impl MemorySelection {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.push(path, bytes);
        self
    }

    pub fn push(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files.push((path.into(), bytes.into()));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Selection for MemorySelection {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn entries(&self, token: &CancellationToken) -> Result<Vec<Entry>> {
        let mut entries = Vec::with_capacity(self.files.len());
        for (path, bytes) in &self.files {
            token.check()?;
            if normalize_path(path).is_empty() {
                log::warn!("Skipping dropped item with empty path '{}'", path);
                continue;
            }
            entries.push(Entry::file(path, Arc::new(InMemory::new(bytes.clone()))));
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
