//! Renders a [`FileTree`] as an ASCII tree.

use crate::tree::{FileStatus, FileTree, TreeNode};

/// Renders `tree` below a `root_label/` line, one node per line, in display
/// order. Files without text are tagged with their status.
///
/// # Examples
/// ```
/// use foldcat::output::render_tree;
/// use foldcat::tree::{FileStatus, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.add_file("src/lib.rs", FileStatus::Text);
/// builder.add_file("logo.png", FileStatus::Binary);
/// let (tree, _) = builder.finish();
/// assert_eq!(
///     render_tree(&tree, "proj"),
///     "proj/\n├── src/\n│   └── lib.rs\n└── logo.png [binary]\n"
/// );
/// ```
pub fn render_tree(tree: &FileTree, root_label: &str) -> String {
    let mut out = format!("{}/\n", root_label.trim_end_matches('/'));
    render_children(tree.root(), "", &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(&child.name);
        match child.status() {
            None => out.push('/'),
            Some(FileStatus::Text) => {}
            Some(status) => {
                out.push_str(" [");
                out.push_str(&status.to_string());
                out.push(']');
            }
        }
        out.push('\n');

        if child.is_dir() {
            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            render_children(child, &child_prefix, out);
        }
    }
}
