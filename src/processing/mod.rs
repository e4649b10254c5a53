//! Handles the per-leaf processing stage of the ingestion pipeline.
//!
//! Every file entry that survives archive expansion is read through a bounded
//! reader, classified, decoded and passed through the extract strategy.
//! Leaves are independent, so they are processed in parallel with Rayon;
//! results come back in input order.

use crate::config::ProcessingConfig;
use crate::errors::{Issue, IssueKind, Result};
use crate::selection::Entry;
use crate::session::RunContext;
use crate::tree::FileStatus;
use log::{debug, trace};
use rayon::prelude::*;

pub mod classify;
pub mod decode;
pub mod extract;

use classify::{classify, Classification};
use decode::decode;

/// The outcome of processing one file entry.
#[derive(Debug, Clone)]
pub struct ProcessedLeaf {
    pub path: String,
    pub status: FileStatus,
    /// Extracted text. `Some` exactly when `status` is [`FileStatus::Text`].
    pub text: Option<String>,
    /// Problems recorded for this leaf; none of them abort the run.
    pub issues: Vec<Issue>,
}

impl ProcessedLeaf {
    fn without_text(path: &str, status: FileStatus, issues: Vec<Issue>) -> Self {
        Self {
            path: path.to_string(),
            status,
            text: None,
            issues,
        }
    }
}

/// Processes a batch of file entries in parallel.
///
/// Each finished leaf advances the run's progress by one unit.
///
/// # Errors
/// Only [`Error::Interrupted`](crate::Error::Interrupted). Per-entry failures
/// are reported inside the returned leaves.
pub fn process_entries(
    entries: &[Entry],
    config: &ProcessingConfig,
    ctx: &RunContext,
) -> Result<Vec<ProcessedLeaf>> {
    debug!("Processing {} leaves", entries.len());
    entries
        .par_iter()
        .map(|entry| {
            let leaf = process_entry(entry, config, ctx)?;
            ctx.progress.advance(1);
            Ok(leaf)
        })
        .collect()
}

/// Reads, classifies, decodes and extracts one file entry.
///
/// # Errors
/// Only [`Error::Interrupted`](crate::Error::Interrupted), checked before
/// reading and again after reading and after decoding.
pub fn process_entry(
    entry: &Entry,
    config: &ProcessingConfig,
    ctx: &RunContext,
) -> Result<ProcessedLeaf> {
    ctx.checkpoint()?;
    let path = entry.path.as_str();
    let limits = config.limits();

    if entry.size() > config.max_file_size {
        return Ok(oversized(path, entry.size(), config.max_file_size));
    }

    // One byte past the limit reveals a declared size that lied.
    let bytes = match entry.read_bounded(config.max_file_size.saturating_add(1)) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Read failed for {}: {}", path, e);
            let issue = Issue::new(path, IssueKind::EntryRead, e.to_string());
            return Ok(ProcessedLeaf::without_text(
                path,
                FileStatus::failed(e.to_string()),
                vec![issue],
            ));
        }
    };
    ctx.checkpoint()?;

    let size = bytes.len() as u64;
    if size > config.max_file_size {
        return Ok(oversized(path, size, config.max_file_size));
    }

    let classification = classify(&bytes, size, &limits);
    trace!("Classified {} as {:?}", path, classification);
    let fallback = match classification {
        Classification::Text => None,
        Classification::Unknown if config.fallback_encoding.is_some() => config.fallback_encoding,
        other => return Ok(ProcessedLeaf::without_text(path, other.into(), Vec::new())),
    };

    let decoded = decode(&bytes, fallback);
    let mut issues = Vec::new();
    if decoded.lossy {
        issues.push(Issue::new(
            path,
            IssueKind::DecodeWarning,
            format!("invalid {} sequences replaced", decoded.encoding),
        ));
    }
    let text = config.extractor.extract(path, &decoded.text);
    ctx.checkpoint()?;

    Ok(ProcessedLeaf {
        path: path.to_string(),
        status: FileStatus::Text,
        text: Some(text),
        issues,
    })
}

fn oversized(path: &str, size: u64, limit: u64) -> ProcessedLeaf {
    debug!("Skipping oversized file {} ({} bytes)", path, size);
    let issue = Issue::new(
        path,
        IssueKind::SizeLimitExceeded,
        format!("{} bytes exceeds the {} byte limit", size, limit),
    );
    ProcessedLeaf::without_text(path, FileStatus::Oversized, vec![issue])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancellationToken;
    use crate::config::ConfigBuilder;
    use crate::progress::ProgressTracker;
    use crate::selection::{ByteProvider, InMemory};
    use std::io;
    use std::sync::Arc;

    fn ctx() -> RunContext {
        RunContext::new(CancellationToken::new(), Arc::new(ProgressTracker::new(None)))
    }

    fn entry(path: &str, bytes: &[u8]) -> Entry {
        Entry::file(path, Arc::new(InMemory::new(bytes.to_vec())))
    }

    #[derive(Debug)]
    struct Unreadable;

    impl ByteProvider for Unreadable {
        fn size(&self) -> u64 {
            4
        }
        fn read_bounded(&self, _limit: u64) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
        fn fingerprint(&self) -> String {
            "x".to_string()
        }
    }

    /// Declares a tiny size but delivers more bytes than asked for would allow.
    #[derive(Debug)]
    struct LyingSize(Vec<u8>);

    impl ByteProvider for LyingSize {
        fn size(&self) -> u64 {
            1
        }
        fn read_bounded(&self, limit: u64) -> io::Result<Vec<u8>> {
            Ok(self.0.iter().copied().take(limit as usize).collect())
        }
        fn fingerprint(&self) -> String {
            "lie".to_string()
        }
    }

    #[test]
    fn test_text_leaf() -> Result<()> {
        let config = ConfigBuilder::new().build()?.processing;
        let leaf = process_entry(&entry("a.txt", b"one\r\ntwo"), &config, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Text);
        assert_eq!(leaf.text.as_deref(), Some("one\ntwo"));
        assert!(leaf.issues.is_empty());
        Ok(())
    }

    #[test]
    fn test_binary_leaf_has_no_text() -> Result<()> {
        let config = ConfigBuilder::new().build()?.processing;
        let leaf = process_entry(&entry("img.bin", b"\x00\x01\x02\x03"), &config, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Binary);
        assert!(leaf.text.is_none());
        Ok(())
    }

    #[test]
    fn test_oversized_by_declared_and_actual_size() -> Result<()> {
        let config = ConfigBuilder::new().max_file_size("8").build()?.processing;
        let leaf = process_entry(&entry("big.txt", b"0123456789"), &config, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Oversized);
        assert_eq!(leaf.issues[0].kind, IssueKind::SizeLimitExceeded);

        let liar = Entry::file("liar.txt", Arc::new(LyingSize(vec![b'a'; 100])));
        let leaf = process_entry(&liar, &config, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Oversized);
        Ok(())
    }

    #[test]
    fn test_unreadable_leaf_is_failed() -> Result<()> {
        let config = ConfigBuilder::new().build()?.processing;
        let leaf = process_entry(&Entry::file("locked.txt", Arc::new(Unreadable)), &config, &ctx())?;
        assert!(leaf.status.is_failed());
        assert_eq!(leaf.issues[0].kind, IssueKind::EntryRead);
        Ok(())
    }

    #[test]
    fn test_unknown_needs_fallback_encoding() -> Result<()> {
        let latin1 = [b'c', b'a', b'f', 0xE9];
        let plain = ConfigBuilder::new().build()?.processing;
        let leaf = process_entry(&entry("l.txt", &latin1), &plain, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Unknown);
        assert!(leaf.text.is_none());

        let with_fallback = ConfigBuilder::new().encoding("latin1").build()?.processing;
        let leaf = process_entry(&entry("l.txt", &latin1), &with_fallback, &ctx())?;
        assert_eq!(leaf.status, FileStatus::Text);
        assert_eq!(leaf.text.as_deref(), Some("café"));
        Ok(())
    }

    #[test]
    fn test_extract_strategy_applied() -> Result<()> {
        let config = ConfigBuilder::new().extract_content(true).build()?.processing;
        let leaf = process_entry(&entry("m.rs", b"// hi\n\nfn x() {}\n"), &config, &ctx())?;
        assert_eq!(leaf.text.as_deref(), Some("fn x() {}"));
        Ok(())
    }

    #[test]
    fn test_batch_keeps_order_and_advances_progress() -> Result<()> {
        let config = ConfigBuilder::new().build()?.processing;
        let entries: Vec<Entry> = (0..20)
            .map(|i| entry(&format!("f{:02}.txt", i), format!("{}", i).as_bytes()))
            .collect();
        let ctx = ctx();
        ctx.progress.add_total(20);
        let leaves = process_entries(&entries, &config, &ctx)?;
        let paths: Vec<_> = leaves.iter().map(|l| l.path.clone()).collect();
        let expected: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, expected);
        assert_eq!(ctx.progress.snapshot().completed_units, 20);
        Ok(())
    }

    #[test]
    fn test_cancelled_batch_is_interrupted() -> Result<()> {
        let config = ConfigBuilder::new().build()?.processing;
        let ctx = ctx();
        ctx.token.cancel();
        let result = process_entries(&[entry("a.txt", b"a")], &config, &ctx);
        assert!(matches!(result, Err(crate::Error::Interrupted)));
        Ok(())
    }
}
