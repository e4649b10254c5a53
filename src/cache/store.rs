// src/cache/store.rs

use super::CacheEntry;
use crate::errors::{io_error_with_path, Error, Result};
use crate::selection::Signature;
use crate::session::Snapshot;
use filetime::FileTime;
use fs2::FileExt;
use log::debug;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const BLOB_EXTENSION: &str = "json";
const LOCK_FILE: &str = ".lock";

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    signature: &'a Signature,
    snapshot: &'a Snapshot,
}

/// Cached snapshots persisted as one JSON blob per signature.
///
/// Writers go through a temporary file and an atomic rename, under an
/// exclusive lock on `<dir>/.lock`, so concurrent processes never observe a
/// half-written blob. Blob modification times double as the recency order:
/// a hit touches its blob and pruning deletes the oldest first.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
    capacity: usize,
}

impl DiskStore {
    pub fn open(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error_with_path(e, &dir))?;
        debug!("Opened disk cache at {}", dir.display());
        Ok(Self { dir, capacity })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, signature: &Signature) -> PathBuf {
        self.dir
            .join(format!("{}.{}", signature.as_str(), BLOB_EXTENSION))
    }

    /// Holds the directory lock until the returned file is dropped.
    fn lock(&self) -> Result<File> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| io_error_with_path(e, &path))?;
        file.lock_exclusive()
            .map_err(|e| io_error_with_path(e, &path))?;
        Ok(file)
    }

    /// Loads the snapshot stored for `signature`.
    ///
    /// # Errors
    /// [`Error::CacheCorrupt`] if the blob exists but cannot be decoded or
    /// was written for a different signature. Callers should treat this as
    /// a miss and [`remove`](Self::remove) the blob.
    pub fn load(&self, signature: &Signature) -> Result<Option<Snapshot>> {
        let path = self.blob_path(signature);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error_with_path(e, &path)),
        };
        let corrupt = |reason: String| Error::CacheCorrupt {
            path: path.display().to_string(),
            reason,
        };
        let entry: CacheEntry =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| corrupt(e.to_string()))?;
        if &entry.signature != signature {
            return Err(corrupt(format!(
                "blob holds signature {}",
                entry.signature
            )));
        }
        if let Err(e) = filetime::set_file_mtime(&path, FileTime::now()) {
            log::warn!("Could not refresh cache entry {}: {}", path.display(), e);
        }
        debug!("Disk cache hit for {}", signature);
        Ok(Some(entry.snapshot))
    }

    /// Writes `snapshot` under `signature`, then prunes to capacity.
    pub fn save(&self, signature: &Signature, snapshot: &Snapshot) -> Result<()> {
        let _lock = self.lock()?;
        let path = self.blob_path(signature);
        let temp = NamedTempFile::new_in(&self.dir).map_err(|e| io_error_with_path(e, &self.dir))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(
                &mut writer,
                &CacheEntryRef {
                    signature,
                    snapshot,
                },
            )
            .map_err(|e| io_error_with_path(e.into(), temp.path()))?;
            writer
                .flush()
                .map_err(|e| io_error_with_path(e, temp.path()))?;
        }
        temp.persist(&path)
            .map_err(|e| io_error_with_path(e.error, &path))?;
        debug!("Stored cache entry {}", path.display());
        self.prune_locked()
    }

    pub fn remove(&self, signature: &Signature) -> Result<()> {
        let _lock = self.lock()?;
        let path = self.blob_path(signature);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error_with_path(e, &path)),
            _ => Ok(()),
        }
    }

    /// Deletes every blob.
    pub fn clear(&self) -> Result<()> {
        let _lock = self.lock()?;
        for (path, _) in self.blobs()? {
            fs::remove_file(&path).map_err(|e| io_error_with_path(e, &path))?;
        }
        Ok(())
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> Result<usize> {
        Ok(self.blobs()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn prune_locked(&self) -> Result<()> {
        let mut blobs = self.blobs()?;
        if blobs.len() <= self.capacity {
            return Ok(());
        }
        // Newest first.
        blobs.sort_by(|a, b| b.1.cmp(&a.1));
        for (path, _) in blobs.into_iter().skip(self.capacity) {
            debug!("Evicting cache entry {}", path.display());
            fs::remove_file(&path).map_err(|e| io_error_with_path(e, &path))?;
        }
        Ok(())
    }

    fn blobs(&self) -> Result<Vec<(PathBuf, FileTime)>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| io_error_with_path(e, &self.dir))?;
        let mut blobs = Vec::new();
        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Ok(metadata) = dir_entry.metadata() {
                blobs.push((path, FileTime::from_last_modification_time(&metadata)));
            }
        }
        Ok(blobs)
    }
}
