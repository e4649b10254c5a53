use super::{display_order, FileStatus, FileTree, NodeKind, TreeNode};
use crate::errors::{Issue, IssueKind};
use crate::selection::normalize_path;
use std::collections::HashMap;

const ROOT: usize = 0;

#[derive(Debug)]
enum SlotKind {
    Directory,
    File(FileStatus),
}

#[derive(Debug)]
struct Slot {
    name: String,
    full_path: String,
    kind: SlotKind,
    children: Vec<usize>,
}

/// Collects entries in any order and turns them into an ordered [`FileTree`].
///
/// Nodes live in an arena indexed by exact path. Missing parent directories
/// are created on demand. A path claimed both as a file and as a directory
/// keeps whichever came first; the other is dropped and reported as a
/// [`IssueKind::PathConflict`].
///
/// # Examples
/// ```
/// use foldcat::tree::{FileStatus, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.add_file("src/main.rs", FileStatus::Text);
/// builder.add_file("Cargo.toml", FileStatus::Text);
/// let (tree, issues) = builder.finish();
/// assert!(issues.is_empty());
/// assert_eq!(tree.root().children[0].name, "src");
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    slots: Vec<Slot>,
    by_path: HashMap<String, usize>,
    issues: Vec<Issue>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let root = Slot {
            name: String::new(),
            full_path: String::new(),
            kind: SlotKind::Directory,
            children: Vec::new(),
        };
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), ROOT);
        Self {
            slots: vec![root],
            by_path,
            issues: Vec::new(),
        }
    }

    /// Adds a directory and any missing ancestors.
    pub fn add_directory(&mut self, path: &str) {
        let path = normalize_path(path);
        if self.reject_line_breaks(&path) {
            return;
        }
        if self.ensure_dir(&path).is_none() {
            self.conflict(&path, "a file already uses this path");
        }
    }

    /// Adds a file, or updates the status of a file already at `path`.
    pub fn add_file(&mut self, path: &str, status: FileStatus) {
        let path = normalize_path(path);
        if path.is_empty() || self.reject_line_breaks(&path) {
            return;
        }
        if let Some(&index) = self.by_path.get(&path) {
            if matches!(self.slots[index].kind, SlotKind::Directory) {
                self.conflict(&path, "a directory already uses this path");
            } else {
                self.slots[index].kind = SlotKind::File(status);
            }
            return;
        }

        let (parent_path, name) = split_parent(&path);
        let Some(parent) = self.ensure_dir(parent_path) else {
            self.conflict(&path, "an ancestor path is a file");
            return;
        };
        self.insert(parent, name, path.clone(), SlotKind::File(status));
    }

    /// Returns the slot for directory `path`, creating it and its ancestors.
    /// `None` if `path` or an ancestor is a file.
    fn ensure_dir(&mut self, path: &str) -> Option<usize> {
        if let Some(&index) = self.by_path.get(path) {
            return match self.slots[index].kind {
                SlotKind::Directory => Some(index),
                SlotKind::File(_) => None,
            };
        }
        let (parent_path, name) = split_parent(path);
        let parent = self.ensure_dir(parent_path)?;
        Some(self.insert(parent, name, path.to_string(), SlotKind::Directory))
    }

    fn insert(&mut self, parent: usize, name: &str, full_path: String, kind: SlotKind) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            name: name.to_string(),
            full_path: full_path.clone(),
            kind,
            children: Vec::new(),
        });
        self.slots[parent].children.push(index);
        self.by_path.insert(full_path, index);
        index
    }

    /// Document headers are single lines, so a path with a line break has no
    /// faithful block. Such entries are dropped as [`IssueKind::UnsafePath`].
    fn reject_line_breaks(&mut self, path: &str) -> bool {
        if !path.contains(['\n', '\r']) {
            return false;
        }
        let shown = path.escape_debug().to_string();
        log::warn!("Dropping '{}': line break in path", shown);
        self.issues
            .push(Issue::new(shown, IssueKind::UnsafePath, "line break in path"));
        true
    }

    fn conflict(&mut self, path: &str, message: &str) {
        log::warn!("Dropping '{}': {}", path, message);
        self.issues
            .push(Issue::new(path, IssueKind::PathConflict, message));
    }

    /// Number of nodes added so far, excluding the root.
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the arena into an ordered tree and returns the path conflicts
    /// seen along the way.
    pub fn finish(mut self) -> (FileTree, Vec<Issue>) {
        let root = self.build_node(ROOT);
        (FileTree::from_root(root), self.issues)
    }

    fn build_node(&mut self, index: usize) -> TreeNode {
        let child_indices = std::mem::take(&mut self.slots[index].children);
        let mut children: Vec<TreeNode> = child_indices
            .into_iter()
            .map(|child| self.build_node(child))
            .collect();
        children.sort_by(display_order);

        let slot = &mut self.slots[index];
        let kind = match std::mem::replace(&mut slot.kind, SlotKind::Directory) {
            SlotKind::Directory => NodeKind::Directory,
            SlotKind::File(status) => NodeKind::File { status },
        };
        TreeNode {
            name: std::mem::take(&mut slot.name),
            full_path: std::mem::take(&mut slot.full_path),
            kind,
            children,
        }
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}
