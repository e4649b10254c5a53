use crate::assemble::Assembly;
use crate::errors::Issue;
use crate::tree::{FileStatus, FileTree};
use serde::{Deserialize, Serialize};

/// Everything one run publishes: the tree, the document with its index, and
/// the counts shown in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Label of the selection this was built from.
    pub label: String,
    pub tree: FileTree,
    pub assembly: Assembly,
    pub stats: Stats,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, tree: FileTree, assembly: Assembly, issues: Vec<Issue>) -> Self {
        let stats = Stats::compute(&tree, &assembly, issues);
        Self {
            label: label.into(),
            tree,
            assembly,
            stats,
        }
    }

    /// A snapshot of an empty selection.
    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, FileTree::default(), Assembly::default(), Vec::new())
    }

    /// Recomputes the counts after the tree or document changed. Issues are
    /// carried over as they are.
    pub(crate) fn refresh_stats(&mut self) {
        let issues = std::mem::take(&mut self.stats.issues);
        self.stats = Stats::compute(&self.tree, &self.assembly, issues);
    }
}

/// Counts over a snapshot, plus the issue log of the run that built it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_files: usize,
    pub text_files: usize,
    /// Binary, oversized and undecodable files.
    pub binary_files: usize,
    pub failed_files: usize,
    /// Issues that did not drop their entry, such as lossy decodes.
    pub warnings: usize,
    pub lines: usize,
    pub chars: usize,
    /// Sorted by path.
    pub issues: Vec<Issue>,
}

impl Stats {
    pub fn compute(tree: &FileTree, assembly: &Assembly, mut issues: Vec<Issue>) -> Self {
        let mut stats = Stats {
            lines: assembly.document.line_count(),
            chars: assembly.document.char_count(),
            ..Stats::default()
        };
        for node in tree.files() {
            stats.total_files += 1;
            match node.status() {
                Some(FileStatus::Text) => stats.text_files += 1,
                Some(FileStatus::Failed { .. }) => stats.failed_files += 1,
                Some(_) => stats.binary_files += 1,
                None => {}
            }
        }
        issues.sort_by(|a, b| a.path.cmp(&b.path));
        stats.warnings = issues.iter().filter(|i| !i.kind.is_failure()).count();
        stats.issues = issues;
        stats
    }
}
