//! Remembers recent results keyed by selection signature.
//!
//! The in-memory part is a small LRU of shared snapshots. With the
//! `disk-cache` feature and a configured directory, entries are also
//! persisted as opaque blobs so they survive between processes. A blob that
//! cannot be used is logged, deleted and treated as a miss.

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::selection::Signature;
use crate::session::Snapshot;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "disk-cache")]
mod store;

#[cfg(feature = "disk-cache")]
pub use store::DiskStore;

/// One persisted cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub signature: Signature,
    pub snapshot: Snapshot,
}

/// The platform cache directory used by the CLI, if one can be determined.
#[cfg(feature = "disk-cache")]
pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", crate::constants::APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
}

/// The platform cache directory used by the CLI, if one can be determined.
#[cfg(not(feature = "disk-cache"))]
pub fn default_cache_dir() -> Option<PathBuf> {
    None
}

/// A bounded least-recently-used cache of snapshots.
///
/// # Examples
/// ```
/// use foldcat::cache::ResultCache;
/// use foldcat::config::CacheConfig;
/// use foldcat::selection::Signature;
/// use foldcat::session::Snapshot;
/// use std::sync::Arc;
///
/// let mut cache = ResultCache::new(&CacheConfig { capacity: 2, directory: None });
/// let sig = Signature::compute(&[], "cfg");
/// cache.store(sig.clone(), Arc::new(Snapshot::empty("demo")));
/// assert!(cache.lookup(&sig).is_some());
/// ```
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    /// Most recently used first.
    entries: VecDeque<(Signature, Arc<Snapshot>)>,
    #[cfg(feature = "disk-cache")]
    disk: Option<DiskStore>,
    /// Kept even when caching is disabled so that `clear` can still empty it.
    #[cfg(feature = "disk-cache")]
    directory: Option<PathBuf>,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            capacity: config.capacity,
            entries: VecDeque::with_capacity(config.capacity),
            #[cfg(feature = "disk-cache")]
            disk: open_disk_store(config),
            #[cfg(feature = "disk-cache")]
            directory: config.directory.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the snapshot stored for `signature` and marks it most
    /// recently used. Falls back to the disk store on a memory miss.
    pub fn lookup(&mut self, signature: &Signature) -> Option<Arc<Snapshot>> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(position) = self.entries.iter().position(|(sig, _)| sig == signature) {
            let entry = self.entries.remove(position)?;
            let snapshot = entry.1.clone();
            self.entries.push_front(entry);
            debug!("Memory cache hit for {}", signature);
            return Some(snapshot);
        }
        let snapshot = Arc::new(self.load_from_disk(signature)?);
        self.insert(signature.clone(), snapshot.clone());
        Some(snapshot)
    }

    /// Stores `snapshot` as the most recent entry, evicting the least
    /// recently used one beyond capacity.
    pub fn store(&mut self, signature: Signature, snapshot: Arc<Snapshot>) {
        if self.capacity == 0 {
            return;
        }
        #[cfg(feature = "disk-cache")]
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.save(&signature, &snapshot) {
                log::warn!("Could not persist cache entry {}: {}", signature, e);
            }
        }
        self.insert(signature, snapshot);
    }

    fn insert(&mut self, signature: Signature, snapshot: Arc<Snapshot>) {
        self.entries.retain(|(sig, _)| sig != &signature);
        self.entries.push_front((signature, snapshot));
        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_back() {
                debug!("Evicted {} from memory cache", evicted);
            }
        }
    }

    /// Signatures held in memory, most recent first.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.entries.iter().map(|(sig, _)| sig)
    }

    /// Drops every entry, in memory and on disk.
    ///
    /// A configured directory is emptied even when a zero capacity keeps the
    /// cache from using it.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        #[cfg(feature = "disk-cache")]
        match (&self.disk, &self.directory) {
            (Some(disk), _) => disk.clear()?,
            (None, Some(dir)) if dir.is_dir() => DiskStore::open(dir, self.capacity)?.clear()?,
            _ => {}
        }
        Ok(())
    }

    #[cfg(feature = "disk-cache")]
    fn load_from_disk(&self, signature: &Signature) -> Option<Snapshot> {
        let disk = self.disk.as_ref()?;
        match disk.load(signature) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("{}; discarding it", e);
                if let Err(e) = disk.remove(signature) {
                    log::warn!("Could not delete unusable cache entry: {}", e);
                }
                None
            }
        }
    }

    #[cfg(not(feature = "disk-cache"))]
    fn load_from_disk(&self, _signature: &Signature) -> Option<Snapshot> {
        None
    }
}

#[cfg(feature = "disk-cache")]
fn open_disk_store(config: &CacheConfig) -> Option<DiskStore> {
    if config.capacity == 0 {
        return None;
    }
    let dir = config.directory.as_ref()?;
    match DiskStore::open(dir, config.capacity) {
        Ok(store) => Some(store),
        Err(e) => {
            log::warn!("Disk cache disabled: {}", e);
            None
        }
    }
}
