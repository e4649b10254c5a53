//! The ingestion session: runs the pipeline and owns the published result.
//!
//! A [`Session`] runs at most one ingestion at a time. Starting a new one
//! cancels the active run and waits for it to let go of shared state. A run
//! only ever replaces the published [`Snapshot`] when it completes, so a
//! cancelled or failed run leaves the previous result authoritative. Between
//! runs the snapshot can be edited and pruned in place; those changes patch
//! the document and its index instead of re-running the pipeline.

use crate::assemble::Delta;
use crate::cache::ResultCache;
use crate::cancellation::CancellationToken;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::progress::{Phase, ProgressReporter, ProgressState, ProgressTracker};
use crate::selection::{normalize_path, Selection, Signature};
use crate::tree::TreeNode;
use log::{debug, info};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};

mod run;
mod snapshot;

pub use run::RunContext;
pub use snapshot::{Snapshot, Stats};

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    /// The selection root could not be read.
    Failed,
}

/// Where a tree node's content starts in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The file whose block was located. For a directory this is its first
    /// text file in document order.
    pub path: String,
    /// Zero-based line of the block header.
    pub line: usize,
    /// Offset of the block header in characters.
    pub offset: usize,
}

/// Runs ingestions and serves the published result.
///
/// # Examples
/// ```
/// use foldcat::selection::MemorySelection;
/// use foldcat::{Config, Session};
///
/// # fn main() -> foldcat::Result<()> {
/// let session = Session::new(Config::default());
/// let selection = MemorySelection::new("drop")
///     .with_file("notes/todo.txt", b"buy milk".to_vec())
///     .with_file("readme.md", b"# hello".to_vec());
/// session.ingest(&selection)?;
///
/// let location = session.locate("notes")?;
/// assert_eq!(location.path, "notes/todo.txt");
/// assert_eq!(location.line, 0);
/// session.edit_file("readme.md", "# hello\nworld")?;
/// assert_eq!(session.file_text("readme.md")?, "# hello\nworld");
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: Config,
    published: RwLock<Option<Arc<Snapshot>>>,
    /// Token of the run currently in flight.
    active: Mutex<Option<CancellationToken>>,
    /// Held for the whole duration of a run.
    run_lock: Mutex<()>,
    cache: Mutex<ResultCache>,
    state: Mutex<RunState>,
    progress: Mutex<Arc<ProgressTracker>>,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("progress", &self.progress())
            .field("published", &self.snapshot().map(|s| s.label.clone()))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self::build(config, None)
    }

    /// Creates a session whose runs report progress to `reporter`.
    pub fn with_reporter(config: Config, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self::build(config, Some(reporter))
    }

    fn build(config: Config, reporter: Option<Arc<dyn ProgressReporter>>) -> Self {
        let cache = ResultCache::new(&config.cache);
        Self {
            config,
            published: RwLock::new(None),
            active: Mutex::new(None),
            run_lock: Mutex::new(()),
            cache: Mutex::new(cache),
            state: Mutex::new(RunState::Idle),
            progress: Mutex::new(Arc::new(ProgressTracker::new(None))),
            reporter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingests `selection` and publishes the result.
    ///
    /// Any run already in flight is cancelled first. An unchanged selection
    /// is served from the cache without re-processing.
    ///
    /// # Errors
    /// - [`Error::Interrupted`] if this run was cancelled. Nothing is published.
    /// - [`Error::RootUnreadable`] if the selection root cannot be read. The
    ///   session moves to [`RunState::Failed`].
    #[tracing::instrument(skip_all, fields(selection = %selection.label()))]
    pub fn ingest(&self, selection: &dyn Selection) -> Result<Arc<Snapshot>> {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.active).replace(token.clone()) {
            debug!("Cancelling the previous run");
            previous.cancel();
        }
        let _run = lock(&self.run_lock);
        // A newer ingestion may have superseded this one while it waited.
        token.check()?;

        let progress = Arc::new(ProgressTracker::new(self.reporter.clone()));
        *lock(&self.progress) = progress.clone();
        *lock(&self.state) = RunState::Running;
        progress.set_phase(Phase::Scanning);

        let outcome = self.run(selection, &token, &progress);
        let state = match &outcome {
            Ok(_) => RunState::Completed,
            Err(Error::Interrupted) => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };
        *lock(&self.state) = state;
        info!("Run finished: {:?}", state);

        let mut active = lock(&self.active);
        if active
            .as_ref()
            .is_some_and(|t| CancellationToken::ptr_eq(t, &token))
        {
            *active = None;
        }
        outcome
    }

    fn run(
        &self,
        selection: &dyn Selection,
        token: &CancellationToken,
        progress: &Arc<ProgressTracker>,
    ) -> Result<Arc<Snapshot>> {
        let label = selection.label();
        let entries = selection.entries(token)?;
        token.check()?;
        debug!("Selection '{}' has {} entries", label, entries.len());

        let signature = Signature::compute(&entries, &self.config.fingerprint());
        if let Some(hit) = lock(&self.cache).lookup(&signature) {
            info!("Serving '{}' from cache", label);
            self.publish(hit.clone());
            progress.finish();
            return Ok(hit);
        }

        let ctx = RunContext::new(token.clone(), progress.clone());
        let snapshot = Arc::new(run::execute(&label, entries, &self.config, ctx)?);
        token.check()?;

        lock(&self.cache).store(signature, snapshot.clone());
        self.publish(snapshot.clone());
        progress.finish();
        Ok(snapshot)
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.published.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
    }

    /// Cancels the run in flight, if any. Returns immediately.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            info!("Cancellation requested");
            token.cancel();
        }
    }

    /// Cancels any run and drops the published result. The cache is kept.
    pub fn reset(&self) {
        self.cancel();
        let _run = lock(&self.run_lock);
        *self.published.write().unwrap_or_else(|e| e.into_inner()) = None;
        *lock(&self.progress) = Arc::new(ProgressTracker::new(None));
        *lock(&self.state) = RunState::Idle;
        debug!("Session reset");
    }

    /// Empties the result cache, including persisted entries.
    pub fn clear_cache(&self) -> Result<()> {
        lock(&self.cache).clear()
    }

    /// The currently published result.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn require_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot().ok_or(Error::NothingPublished)
    }

    pub fn progress(&self) -> ProgressState {
        lock(&self.progress).snapshot()
    }

    pub fn state(&self) -> RunState {
        *lock(&self.state)
    }

    /// Finds where the node at `path` starts in the document.
    ///
    /// # Errors
    /// [`Error::UnknownPath`] if no node has that path, [`Error::NotAFile`]
    /// if neither the node nor any descendant has text.
    pub fn locate(&self, path: &str) -> Result<Location> {
        let snapshot = self.require_snapshot()?;
        let path = normalize_path(path);
        let node = snapshot
            .tree
            .find(&path)
            .ok_or_else(|| Error::UnknownPath(path.clone()))?;
        let target = node
            .files()
            .into_iter()
            .find(|n| n.has_text())
            .ok_or_else(|| Error::NotAFile(path.clone()))?;
        let span = snapshot
            .assembly
            .index
            .get(&target.full_path)
            .ok_or_else(|| Error::NotAFile(path.clone()))?;
        Ok(Location {
            path: span.path.clone(),
            line: span.start_line,
            offset: span.start_offset,
        })
    }

    /// The current text of one file, including edits.
    pub fn file_text(&self, path: &str) -> Result<String> {
        let snapshot = self.require_snapshot()?;
        let path = normalize_path(path);
        let node = snapshot
            .tree
            .find(&path)
            .ok_or_else(|| Error::UnknownPath(path.clone()))?;
        if !node.has_text() {
            return Err(Error::NotAFile(path));
        }
        snapshot
            .assembly
            .file_text(&path)
            .ok_or(Error::NotAFile(path))
    }

    /// The whole document.
    pub fn document(&self) -> Result<String> {
        Ok(self
            .require_snapshot()?
            .assembly
            .document
            .as_str()
            .to_string())
    }

    /// Writes the document to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.require_snapshot()?;
        crate::output::writer::save_atomic(path, snapshot.assembly.document.as_str())
    }

    /// Copies the document to the system clipboard.
    #[cfg(feature = "clipboard")]
    pub fn copy(&self) -> Result<()> {
        let snapshot = self.require_snapshot()?;
        crate::output::writer::copy_to_clipboard(snapshot.assembly.document.as_str())
    }

    /// Takes the run lock for a mutation, failing instead of waiting.
    fn try_run_lock(&self) -> Result<MutexGuard<'_, ()>> {
        match self.run_lock.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(Error::Busy),
            Err(TryLockError::Poisoned(e)) => Ok(e.into_inner()),
        }
    }

    /// Replaces the content of one text file and republishes.
    ///
    /// Only the edited block is re-rendered; later spans are shifted by the
    /// returned delta. The cache keeps the unedited result.
    ///
    /// # Errors
    /// [`Error::Busy`] while a run is active, [`Error::NothingPublished`],
    /// [`Error::UnknownPath`], or [`Error::NotAFile`] for binary, failed and
    /// directory nodes.
    pub fn edit_file(&self, path: &str, new_text: &str) -> Result<Delta> {
        let _run = self.try_run_lock()?;
        let path = normalize_path(path);
        let mut published = self.published.write().unwrap_or_else(|e| e.into_inner());
        let current = published.as_mut().ok_or(Error::NothingPublished)?;
        let node = current
            .tree
            .find(&path)
            .ok_or_else(|| Error::UnknownPath(path.clone()))?;
        if !node.has_text() {
            return Err(Error::NotAFile(path));
        }

        let next = Arc::make_mut(current);
        let delta = next.assembly.splice(&path, new_text)?;
        next.refresh_stats();
        info!("Edited {} ({:+} lines)", path, delta.lines.0);
        Ok(delta)
    }

    /// Removes a node and its subtree from the tree and the document and
    /// republishes. Returns the removed node.
    ///
    /// # Errors
    /// As [`edit_file`](Self::edit_file); the root itself cannot be removed.
    pub fn delete_node(&self, path: &str) -> Result<TreeNode> {
        let _run = self.try_run_lock()?;
        let path = normalize_path(path);
        let mut published = self.published.write().unwrap_or_else(|e| e.into_inner());
        let current = published.as_mut().ok_or(Error::NothingPublished)?;
        if path.is_empty() || current.tree.find(&path).is_none() {
            return Err(Error::UnknownPath(path));
        }

        let next = Arc::make_mut(current);
        let removed = next
            .tree
            .remove(&path)
            .ok_or_else(|| Error::UnknownPath(path.clone()))?;
        let dropped = {
            let blocks: Vec<&str> = removed
                .files()
                .into_iter()
                .filter(|n| n.has_text())
                .map(|n| n.full_path.as_str())
                .collect();
            next.assembly.remove(&blocks)
        };
        let prefix = format!("{}/", path);
        next.stats
            .issues
            .retain(|issue| issue.path != path && !issue.path.starts_with(&prefix));
        next.refresh_stats();
        info!("Deleted {} ({} blocks)", path, dropped);
        Ok(removed)
    }
}
