use super::Snapshot;
use crate::archive::expand_entries;
use crate::assemble::assemble;
use crate::cancellation::CancellationToken;
use crate::config::Config;
use crate::errors::{Issue, Result};
use crate::processing::process_entries;
use crate::progress::{Phase, ProgressTracker};
use crate::selection::Entry;
use crate::tree::{FileStatus, TreeBuilder};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mutable state of one ingestion run, shared by every pipeline stage.
#[derive(Debug)]
pub struct RunContext {
    pub token: CancellationToken,
    pub progress: Arc<ProgressTracker>,
    issues: Mutex<Vec<Issue>>,
}

impl RunContext {
    pub fn new(token: CancellationToken, progress: Arc<ProgressTracker>) -> Self {
        Self {
            token,
            progress,
            issues: Mutex::new(Vec::new()),
        }
    }

    /// Fails with [`Error::Interrupted`](crate::Error::Interrupted) once the
    /// run has been cancelled.
    #[inline]
    pub fn checkpoint(&self) -> Result<()> {
        self.token.check()
    }

    pub fn record(&self, issue: Issue) {
        self.issues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(issue);
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// Runs every stage after enumeration: expansion, processing, tree building
/// and assembly.
///
/// The progress total starts at one unit per top-level archive plus one for
/// assembly, and grows as archives are opened and leaves become known.
pub(crate) fn execute(
    label: &str,
    entries: Vec<Entry>,
    config: &Config,
    ctx: RunContext,
) -> Result<Snapshot> {
    let archives = if config.archive.expand_archives {
        entries.iter().filter(|e| !e.is_dir() && e.is_archive()).count()
    } else {
        0
    };
    ctx.progress.add_total(archives as u64 + 1);

    let expansion = expand_entries(entries, &config.archive, &config.processing, &ctx)?;

    ctx.progress.add_total(expansion.leaves.len() as u64);
    ctx.progress.set_phase(Phase::Processing);
    let mut leaves = process_entries(&expansion.leaves, &config.processing, &ctx)?;
    ctx.checkpoint()?;
    leaves.extend(expansion.processed);

    ctx.progress.set_phase(Phase::Assembling);
    let mut builder = TreeBuilder::new();
    for dir in &expansion.directories {
        builder.add_directory(dir);
    }
    for issue in expansion.failed {
        builder.add_file(&issue.path, FileStatus::failed(issue.message.clone()));
        ctx.record(issue);
    }
    let mut texts = HashMap::with_capacity(leaves.len());
    for leaf in leaves {
        builder.add_file(&leaf.path, leaf.status);
        for issue in leaf.issues {
            ctx.record(issue);
        }
        if let Some(text) = leaf.text {
            texts.insert(leaf.path, text);
        }
    }
    let (tree, conflicts) = builder.finish();
    for issue in conflicts {
        ctx.record(issue);
    }

    let assembly = assemble(&tree, &texts, &ctx.token)?;
    ctx.progress.advance(1);
    debug!(
        "Run '{}' built {} nodes and a {} line document",
        label,
        tree.root().node_count() - 1,
        assembly.document.line_count()
    );
    Ok(Snapshot::new(label, tree, assembly, ctx.into_issues()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;
    use crate::errors::{Error, IssueKind};
    use crate::selection::InMemory;

    fn entry(path: &str, bytes: &[u8]) -> Entry {
        Entry::file(path, Arc::new(InMemory::new(bytes.to_vec())))
    }

    fn run(entries: Vec<Entry>, config: &Config) -> (Result<Snapshot>, Arc<ProgressTracker>) {
        let progress = Arc::new(ProgressTracker::new(None));
        let ctx = RunContext::new(CancellationToken::new(), progress.clone());
        (execute("test", entries, config, ctx), progress)
    }

    #[test]
    fn test_execute_builds_tree_and_document() {
        let config = Config::default();
        let (result, progress) = run(
            vec![
                entry("a.txt", b"alpha"),
                entry("dir/b.txt", b"beta\r\ngamma"),
                entry("img.bin", &[0, 1, 2, 0, 255]),
            ],
            &config,
        );
        let snapshot = result.unwrap();
        assert_eq!(snapshot.stats.text_files, 2);
        assert_eq!(snapshot.stats.binary_files, 1);
        assert_eq!(snapshot.assembly.file_text("dir/b.txt").as_deref(), Some("beta\ngamma"));
        assert!(snapshot.assembly.is_consistent());
        assert!(snapshot.tree.find("img.bin").is_some());

        let state = progress.snapshot();
        assert_eq!(state.completed_units, 4);
        assert_eq!(state.total_units, 4);
    }

    #[test]
    fn test_issues_from_every_stage_are_collected() {
        let mut config = Config::default();
        config.archive = ArchiveConfig {
            max_depth: 1,
            ..ArchiveConfig::default()
        };
        let (result, _) = run(
            vec![entry("broken.zip", b"PK not really"), entry("ok.txt", b"fine")],
            &config,
        );
        let snapshot = result.unwrap();
        assert_eq!(snapshot.stats.failed_files, 1);
        assert_eq!(snapshot.stats.issues.len(), 1);
        assert_eq!(snapshot.stats.issues[0].kind, IssueKind::ArchiveCorrupt);
        assert!(snapshot.tree.find("broken.zip").unwrap().status().unwrap().is_failed());
    }

    #[test]
    fn test_cancelled_before_start() {
        let progress = Arc::new(ProgressTracker::new(None));
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RunContext::new(token, progress);
        let result = execute("test", vec![entry("a.txt", b"a")], &Config::default(), ctx);
        assert!(matches!(result, Err(Error::Interrupted)));
    }
}
