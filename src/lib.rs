//! `foldcat` turns a folder, or a set of dropped files that may include
//! nested ZIP archives, into a navigable file tree and one unified text
//! document in which every file's position is indexed.
//!
//! The pipeline runs inside a [`Session`]:
//! 1.  **Select**: enumerate entries from a [`Selection`](selection::Selection),
//!     either a folder on disk or in-memory dropped files.
//! 2.  **Expand**: unpack ZIP archives, recursively, into ordinary entries.
//! 3.  **Process**: classify, decode and extract every leaf in parallel.
//! 4.  **Assemble**: build the ordered tree and concatenate one block per
//!     text file, recording where each block sits.
//!
//! Runs are cancellable and report progress; unchanged selections are served
//! from a cache. After a run, single files can be edited and nodes deleted
//! without re-running the pipeline.
//!
//! # Example: Library Usage
//!
//! ```
//! use foldcat::selection::FsSelection;
//! use foldcat::{ConfigBuilder, Session};
//! use std::fs;
//! use tempfile::tempdir;
//!
//! # fn main() -> foldcat::Result<()> {
//! let temp_dir = tempdir().unwrap();
//! fs::write(temp_dir.path().join("file1.txt"), "Hello, world!").unwrap();
//! fs::create_dir(temp_dir.path().join("src")).unwrap();
//! fs::write(temp_dir.path().join("src/main.rs"), "fn main() {}").unwrap();
//!
//! let config = ConfigBuilder::new().input_path(temp_dir.path().to_string_lossy()).build()?;
//! let selection = FsSelection::new(&config.input_path, config.discovery.clone());
//! let session = Session::new(config);
//! let snapshot = session.ingest(&selection)?;
//!
//! assert_eq!(snapshot.stats.text_files, 2);
//! assert!(snapshot.assembly.document.as_str().starts_with("## File: src/main.rs\n```rs\n"));
//! assert_eq!(session.locate("file1.txt")?.line, 5);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod assemble;
pub mod cache;
pub mod cancellation;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod output;
pub mod prelude;
pub mod processing;
pub mod progress;
pub mod selection;
pub mod session;
pub mod signal;
pub mod tree;

// Re-export key public types for easier use as a library
pub use cancellation::CancellationToken;
pub use config::{Config, ConfigBuilder, OutputDestination};
pub use errors::{Error, Issue, IssueKind, Result};
pub use session::{Location, RunState, Session, Snapshot, Stats};
