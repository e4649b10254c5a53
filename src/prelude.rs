//! The `foldcat` prelude for convenient library usage.
//!
//! # Example
//!
//! ```
//! use foldcat::prelude::*;
//! # fn main() -> Result<()> {
//!
//! let session = Session::new(ConfigBuilder::new().build()?);
//! let selection = MemorySelection::new("drop").with_file("a.txt", b"hi".to_vec());
//! let snapshot = session.ingest(&selection)?;
//! assert_eq!(parse_document(snapshot.assembly.document.as_str())[0].1, "hi");
//!
//! # Ok(())
//! # }
//! ```

pub use crate::assemble::{parse_document, render_block, Assembly, Delta, PositionIndex};
pub use crate::cancellation::CancellationToken;
pub use crate::config::{Config, ConfigBuilder, OutputDestination};
pub use crate::errors::{Error, Issue, IssueKind, Result};
pub use crate::processing::extract::ContentExtractor;
pub use crate::progress::{Phase, ProgressReporter, ProgressState};
pub use crate::selection::{ByteProvider, Entry, FsSelection, MemorySelection, Selection};
pub use crate::session::{Location, RunState, Session, Snapshot, Stats};
pub use crate::tree::{FileStatus, FileTree, TreeNode};
