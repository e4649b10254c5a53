// src/progress.rs

//! Progress accounting for ingestion runs.
//!
//! A run counts *units of work*: one per processed leaf, one per archive and
//! archive member, and one for the final assembly. The total is an estimate
//! that only ever grows (opening an archive reveals more members), so the
//! fraction shown to the user never jumps backwards.
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A trait for reporting progress, abstracting over specific implementations like `indicatif`.
///
/// # Examples
///
/// ```
/// use foldcat::progress::ProgressReporter;
/// use std::sync::Mutex;
///
/// struct MockProgress {
///     last_message: Mutex<String>,
/// }
/// impl ProgressReporter for MockProgress {
///     fn set_length(&self, _len: u64) {}
///     fn set_position(&self, _pos: u64) {}
///     fn set_message(&self, msg: String) {
///         *self.last_message.lock().unwrap() = msg;
///     }
///     fn finish(&self) {}
///     fn finish_with_message(&self, msg: String) {
///         *self.last_message.lock().unwrap() = msg;
///     }
/// }
///
/// let reporter = MockProgress { last_message: Mutex::new(String::new()) };
/// reporter.set_message("Expanding bundle.zip".to_string());
/// assert_eq!(*reporter.last_message.lock().unwrap(), "Expanding bundle.zip");
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Sets the total number of units to process.
    fn set_length(&self, len: u64);
    /// Sets the current position in the process.
    fn set_position(&self, pos: u64);
    /// Sets a descriptive message for the current operation.
    fn set_message(&self, msg: String);
    /// Finishes the progress reporting, hiding the progress bar.
    fn finish(&self);
    /// Finishes the progress reporting with a final message.
    fn finish_with_message(&self, msg: String);
}

/// A `ProgressReporter` that does nothing.
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn set_length(&self, _len: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self) {}
    fn finish_with_message(&self, _msg: String) {}
}

/// An implementation of `ProgressReporter` using the `indicatif` crate.
#[cfg(feature = "progress")]
#[derive(Clone)]
pub struct IndicatifProgress {
    bar: ProgressBar,
}

#[cfg(feature = "progress")]
impl IndicatifProgress {
    /// Creates a new progress bar with a default style.
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        Self { bar: pb }
    }
}

#[cfg(feature = "progress")]
impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressReporter for IndicatifProgress {
    fn set_length(&self, len: u64) {
        self.bar.set_length(len);
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// The stage a run is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Enumerating the selection.
    Scanning,
    /// Decompressing members of an archive. See [`ProgressState::archive`].
    ExpandingArchive,
    /// Reading, classifying and decoding leaf entries.
    Processing,
    /// Concatenating the document.
    Assembling,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "Idle",
            Phase::Scanning => "Scanning selection",
            Phase::ExpandingArchive => "Expanding archive",
            Phase::Processing => "Processing files",
            Phase::Assembling => "Assembling document",
            Phase::Done => "Done",
        };
        f.write_str(label)
    }
}

/// Sub-progress of the archive currently being expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveProgress {
    pub path: String,
    pub members_done: u64,
    pub members_total: u64,
    /// Uncompressed bytes produced so far.
    pub bytes_done: u64,
    /// Sum of the members' declared uncompressed sizes.
    pub bytes_total: u64,
}

/// A point-in-time view of a run's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub completed_units: u64,
    pub total_units: u64,
    pub phase: Phase,
    pub archive: Option<ArchiveProgress>,
}

impl ProgressState {
    pub fn idle() -> Self {
        Self {
            completed_units: 0,
            total_units: 0,
            phase: Phase::Idle,
            archive: None,
        }
    }

    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total_units == 0 {
            return if self.phase == Phase::Done { 1.0 } else { 0.0 };
        }
        (self.completed_units as f64 / self.total_units as f64).min(1.0)
    }
}

/// Thread-safe, monotonic progress counters for one run.
///
/// Stages running on rayon workers update the tracker concurrently; readers on
/// other threads take [`ProgressTracker::snapshot`]s.
pub struct ProgressTracker {
    completed: AtomicU64,
    total: AtomicU64,
    phase: Mutex<Phase>,
    archive: Mutex<Option<ArchiveProgress>>,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl ProgressTracker {
    pub fn new(reporter: Option<Arc<dyn ProgressReporter>>) -> Self {
        Self {
            completed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            phase: Mutex::new(Phase::Idle),
            archive: Mutex::new(None),
            reporter,
        }
    }

    /// Raises the estimated total. The estimate never decreases.
    pub fn add_total(&self, units: u64) {
        let total = self.total.fetch_add(units, Ordering::SeqCst) + units;
        if let Some(r) = &self.reporter {
            r.set_length(total);
        }
    }

    /// Marks `units` as done. The total is raised if the estimate fell short.
    pub fn advance(&self, units: u64) {
        let done = self.completed.fetch_add(units, Ordering::SeqCst) + units;
        let previous_total = self.total.fetch_max(done, Ordering::SeqCst);
        if let Some(r) = &self.reporter {
            if previous_total < done {
                r.set_length(done);
            }
            r.set_position(done);
        }
    }

    pub fn set_phase(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
        if let Some(r) = &self.reporter {
            r.set_message(phase.to_string());
        }
    }

    /// Starts archive sub-progress and raises the total by the member count.
    ///
    /// Returns the sub-progress of the enclosing archive, if any, so a nested
    /// expansion can hand it back to [`end_archive`](Self::end_archive).
    pub fn begin_archive(
        &self,
        path: &str,
        members_total: u64,
        bytes_total: u64,
    ) -> Option<ArchiveProgress> {
        self.add_total(members_total);
        let outer = self
            .archive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(ArchiveProgress {
                path: path.to_string(),
                members_done: 0,
                members_total,
                bytes_done: 0,
                bytes_total,
            });
        self.set_phase(Phase::ExpandingArchive);
        if let Some(r) = &self.reporter {
            r.set_message(format!("Expanding {}", path));
        }
        outer
    }

    /// Records one decompressed archive member of `bytes` uncompressed bytes.
    pub fn archive_member_done(&self, bytes: u64) {
        if let Some(progress) = self
            .archive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
        {
            progress.members_done += 1;
            progress.bytes_done = progress.bytes_done.saturating_add(bytes);
        }
        self.advance(1);
    }

    /// Ends archive sub-progress, restoring the enclosing archive's state.
    pub fn end_archive(&self, outer: Option<ArchiveProgress>) {
        *self.archive.lock().unwrap_or_else(|e| e.into_inner()) = outer;
    }

    /// Marks every unit as complete.
    pub fn finish(&self) {
        let total = self.total.load(Ordering::SeqCst);
        self.completed.fetch_max(total, Ordering::SeqCst);
        self.end_archive(None);
        self.set_phase(Phase::Done);
        if let Some(r) = &self.reporter {
            r.finish();
        }
    }

    pub fn snapshot(&self) -> ProgressState {
        let completed_units = self.completed.load(Ordering::SeqCst);
        let total_units = self.total.load(Ordering::SeqCst).max(completed_units);
        ProgressState {
            completed_units,
            total_units,
            phase: *self.phase.lock().unwrap_or_else(|e| e.into_inner()),
            archive: self
                .archive
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("state", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_never_decreases_and_covers_completed() {
        let tracker = ProgressTracker::new(None);
        tracker.add_total(2);
        tracker.advance(1);
        tracker.advance(2); // estimate fell short
        let state = tracker.snapshot();
        assert_eq!(state.completed_units, 3);
        assert_eq!(state.total_units, 3);

        tracker.add_total(5);
        assert_eq!(tracker.snapshot().total_units, 8);
    }

    #[test]
    fn test_archive_sub_progress() {
        let tracker = ProgressTracker::new(None);
        tracker.add_total(1);
        tracker.begin_archive("bundle.zip", 2, 100);
        tracker.archive_member_done(40);

        let state = tracker.snapshot();
        assert_eq!(state.phase, Phase::ExpandingArchive);
        let archive = state.archive.expect("archive progress present");
        assert_eq!(archive.members_done, 1);
        assert_eq!(archive.bytes_done, 40);
        assert_eq!(archive.bytes_total, 100);
        assert_eq!(state.total_units, 3);
    }

    #[test]
    fn test_nested_archive_restores_outer() {
        let tracker = ProgressTracker::new(None);
        assert!(tracker.begin_archive("outer.zip", 2, 10).is_none());
        tracker.archive_member_done(5);
        let outer = tracker.begin_archive("outer.zip/inner.zip", 1, 3);
        tracker.archive_member_done(3);
        tracker.end_archive(outer);

        let archive = tracker.snapshot().archive.unwrap();
        assert_eq!(archive.path, "outer.zip");
        assert_eq!(archive.members_done, 1);
        tracker.end_archive(None);
        assert!(tracker.snapshot().archive.is_none());
    }

    #[test]
    fn test_finish_completes_everything() {
        let tracker = ProgressTracker::new(None);
        tracker.add_total(4);
        tracker.advance(1);
        tracker.finish();
        let state = tracker.snapshot();
        assert_eq!(state.completed_units, 4);
        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.fraction(), 1.0);
    }
}
