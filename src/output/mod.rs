//! Presents a published snapshot: document delivery, summary and tree view.

pub mod summary;
mod tree;
pub mod writer;

pub use summary::write_summary;
pub use tree::render_tree;
pub use writer::{deliver, save_atomic};
