//! Expands ZIP archives into the same entry model used for plain files.
//!
//! An expanded archive becomes a directory whose children are its members,
//! so `bundle.zip/src/lib.rs` is an ordinary path in the tree. Expansion
//! recurses into nested archives up to [`ArchiveConfig::max_depth`]. Every
//! failure here is local: it turns one archive or member into a failed node
//! and the walk carries on.
//!
//! Decompressed members are processed in small batches while the archive is
//! being walked, so only their extracted text outlives the expansion.

use crate::config::{ArchiveConfig, ProcessingConfig};
use crate::constants::ARCHIVE_MEMBER_BATCH;
use crate::errors::{Error, Issue, Result};
use crate::processing::{process_entries, ProcessedLeaf};
use crate::progress::Phase;
use crate::selection::Entry;
use crate::session::RunContext;
use log::debug;

mod members;

pub use members::{ArchiveMembers, Member};

/// The flattened result of expanding every archive in a selection.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Plain file entries still to be processed, in encounter order.
    pub leaves: Vec<Entry>,
    /// Archive members, already processed.
    pub processed: Vec<ProcessedLeaf>,
    /// Directory paths, including one per successfully opened archive.
    pub directories: Vec<String>,
    /// Entries that became failed nodes. Each issue's path is the node path.
    pub failed: Vec<Issue>,
}

impl Expansion {
    fn fail(&mut self, issue: Issue) {
        log::warn!("{}", issue);
        self.failed.push(issue);
    }
}

/// Expands archives found among `entries`.
///
/// Non-archive files pass through unchanged, as do archives larger than
/// [`ArchiveConfig::max_archive_size`]. Each top-level archive advances
/// progress by one unit once it is fully expanded; members advance it once
/// when decompressed and once when processed.
///
/// # Errors
/// Only [`Error::Interrupted`]. The token is checked before every entry and
/// after every decompressed member.
pub fn expand_entries(
    entries: Vec<Entry>,
    config: &ArchiveConfig,
    processing: &ProcessingConfig,
    ctx: &RunContext,
) -> Result<Expansion> {
    let mut out = Expansion::default();
    let expander = Expander {
        config,
        processing,
        ctx,
    };

    for entry in entries {
        ctx.checkpoint()?;
        if entry.is_dir() {
            out.directories.push(entry.path);
        } else if config.expand_archives && entry.is_archive() {
            if entry.size() > config.max_archive_size {
                log::warn!(
                    "Not expanding {}: {} bytes exceeds the {} byte archive limit",
                    entry.path,
                    entry.size(),
                    config.max_archive_size
                );
                out.leaves.push(entry);
            } else {
                expander.expand(&entry, 1, &mut out)?;
            }
            ctx.progress.advance(1);
            ctx.progress.set_phase(Phase::Scanning);
        } else {
            out.leaves.push(entry);
        }
    }
    debug!(
        "Expansion complete: {} leaves, {} members, {} directories, {} failed",
        out.leaves.len(),
        out.processed.len(),
        out.directories.len(),
        out.failed.len()
    );
    Ok(out)
}

struct Expander<'a> {
    config: &'a ArchiveConfig,
    processing: &'a ProcessingConfig,
    ctx: &'a RunContext,
}

impl Expander<'_> {
    /// Expands one archive at nesting level `depth` (top level is 1).
    fn expand(&self, entry: &Entry, depth: usize, out: &mut Expansion) -> Result<()> {
        self.ctx.checkpoint()?;
        let opened = ArchiveMembers::open(
            entry,
            self.processing.max_file_size,
            self.config.max_archive_size,
        );
        let mut members = match opened {
            Ok(members) => members,
            Err(err) => {
                out.fail(Issue::from_error(&entry.path, &err));
                return Ok(());
            }
        };
        out.directories.push(entry.path.clone());

        let bytes_total = members.total_bytes();
        let outer = self
            .ctx
            .progress
            .begin_archive(&entry.path, members.len() as u64, bytes_total);
        let result = self.drain(&mut members, depth, out);
        self.ctx.progress.end_archive(outer);
        result
    }

    fn drain(&self, members: &mut ArchiveMembers, depth: usize, out: &mut Expansion) -> Result<()> {
        let mut batch = Vec::with_capacity(ARCHIVE_MEMBER_BATCH);
        for member in members {
            self.ctx.checkpoint()?;
            match member {
                Member::Directory(path) => {
                    self.ctx.progress.archive_member_done(0);
                    out.directories.push(path);
                }
                Member::Failed(issue) => {
                    self.ctx.progress.archive_member_done(0);
                    out.fail(issue);
                }
                Member::File(child) => {
                    self.ctx.progress.archive_member_done(child.size());
                    if !child.is_archive() {
                        batch.push(child);
                        if batch.len() >= ARCHIVE_MEMBER_BATCH {
                            self.flush(&mut batch, out)?;
                        }
                    } else if depth >= self.config.max_depth {
                        let err = Error::ArchiveDepthExceeded {
                            path: child.path.clone(),
                            depth: depth + 1,
                        };
                        out.fail(Issue::from_error(&child.path, &err));
                    } else {
                        self.expand(&child, depth + 1, out)?;
                    }
                }
            }
        }
        self.flush(&mut batch, out)
    }

    /// Processes the pending members and drops their bytes.
    fn flush(&self, batch: &mut Vec<Entry>, out: &mut Expansion) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.ctx.progress.add_total(batch.len() as u64);
        out.processed
            .extend(process_entries(batch, self.processing, self.ctx)?);
        batch.clear();
        Ok(())
    }
}
