//! The hierarchical view of an ingested selection.
//!
//! A [`FileTree`] is produced once per run by [`TreeBuilder::finish`] and is
//! immutable afterwards, apart from [`FileTree::remove`] on the delete path.
//! Nodes never hold file content; a file node's `full_path` is its handle
//! into the document's [`PositionIndex`](crate::assemble::PositionIndex).

use crate::processing::classify::Classification;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

mod builder;

pub use builder::TreeBuilder;

/// What became of a file during processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// Decoded; the file has a block in the document.
    Text,
    Binary,
    /// Above the size threshold; never read.
    Oversized,
    /// Not UTF-8 and no fallback encoding was declared.
    Unknown,
    /// Could not be read or expanded.
    Failed { reason: String },
}

impl FileStatus {
    pub fn has_text(&self) -> bool {
        matches!(self, FileStatus::Text)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        FileStatus::Failed {
            reason: reason.into(),
        }
    }
}

impl From<Classification> for FileStatus {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Text => FileStatus::Text,
            Classification::Binary => FileStatus::Binary,
            Classification::Oversized => FileStatus::Oversized,
            Classification::Unknown => FileStatus::Unknown,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Text => f.write_str("text"),
            FileStatus::Binary => f.write_str("binary"),
            FileStatus::Oversized => f.write_str("oversized"),
            FileStatus::Unknown => f.write_str("unknown encoding"),
            FileStatus::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Directory,
    File { status: FileStatus },
}

/// One node of a [`FileTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Final path segment. Empty for the root.
    pub name: String,
    /// Slash-separated path from the selection root. Empty for the root.
    pub full_path: String,
    pub kind: NodeKind,
    /// Ordered children; always empty for files.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    pub fn status(&self) -> Option<&FileStatus> {
        match &self.kind {
            NodeKind::File { status } => Some(status),
            NodeKind::Directory => None,
        }
    }

    /// Whether this node has a block in the document.
    pub fn has_text(&self) -> bool {
        self.status().is_some_and(FileStatus::has_text)
    }

    /// File nodes of this subtree in depth-first display order.
    pub fn files(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a TreeNode>) {
        if !self.is_dir() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_files(out);
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }
}

/// Canonical sibling order: directories first, then case-insensitive name,
/// with the exact name breaking ties.
pub fn display_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// The ordered tree of one ingested selection.
///
/// Serialized as a flat node list, so persisted trees stay shallow however
/// deep the directories go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FlatTree", from = "FlatTree")]
pub struct FileTree {
    root: TreeNode,
}

#[derive(Serialize, Deserialize)]
struct FlatTree {
    nodes: Vec<FlatNode>,
}

#[derive(Serialize, Deserialize)]
struct FlatNode {
    path: String,
    kind: NodeKind,
}

impl From<FileTree> for FlatTree {
    fn from(tree: FileTree) -> Self {
        let mut nodes = Vec::new();
        let mut stack: Vec<TreeNode> = tree.root.children.into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children.into_iter().rev());
            nodes.push(FlatNode {
                path: node.full_path,
                kind: node.kind,
            });
        }
        Self { nodes }
    }
}

impl From<FlatTree> for FileTree {
    fn from(flat: FlatTree) -> Self {
        let mut builder = TreeBuilder::new();
        for node in flat.nodes {
            match node.kind {
                NodeKind::Directory => builder.add_directory(&node.path),
                NodeKind::File { status } => builder.add_file(&node.path, status),
            }
        }
        builder.finish().0
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self {
            root: TreeNode {
                name: String::new(),
                full_path: String::new(),
                kind: NodeKind::Directory,
                children: Vec::new(),
            },
        }
    }
}

impl FileTree {
    pub(crate) fn from_root(root: TreeNode) -> Self {
        Self { root }
    }

    /// The unnamed root directory.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Exact-path lookup. The empty path is the root.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.iter().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    /// All file nodes in depth-first display order, which is also document order.
    pub fn files(&self) -> Vec<&TreeNode> {
        self.root.files()
    }

    /// Removes the node at `path` with its subtree. The root cannot be removed.
    pub fn remove(&mut self, path: &str) -> Option<TreeNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (last, parents) = segments.split_last()?;
        let mut node = &mut self.root;
        for segment in parents {
            node = node.children.iter_mut().find(|c| c.name == *segment)?;
        }
        let position = node.children.iter().position(|c| c.name == *last)?;
        Some(node.children.remove(position))
    }
}
