// src/output/writer.rs

//! Delivers an assembled document to stdout, a file, or the clipboard.

use crate::config::OutputDestination;
#[cfg(feature = "clipboard")]
use crate::errors::ClipboardError;
use crate::errors::{io_error_with_path, Result};
use log::debug;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const STDOUT_LABEL: &str = "<stdout>";

/// Sends `document` to `destination`.
///
/// # Errors
/// [`Error::Io`](crate::Error::Io) if writing fails, or
/// [`Error::Clipboard`](crate::Error::Clipboard) if the clipboard is unavailable.
pub fn deliver(document: &str, destination: &OutputDestination) -> Result<()> {
    match destination {
        OutputDestination::Stdout => {
            let stdout = io::stdout();
            write_document(stdout.lock(), document)
                .map_err(|e| io_error_with_path(e, STDOUT_LABEL))
        }
        OutputDestination::File(path) => save_atomic(path, document),
        #[cfg(feature = "clipboard")]
        OutputDestination::Clipboard => copy_to_clipboard(document),
    }
}

/// Writes `document` through a buffered writer and flushes it.
pub fn write_document<W: Write>(writer: W, document: &str) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    writer.write_all(document.as_bytes())?;
    writer.flush()
}

/// Writes `document` to `path` through a temporary file in the same
/// directory and a rename, so readers never see a partial file.
pub fn save_atomic(path: &Path, document: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| io_error_with_path(e, dir))?;
    write_document(temp.as_file_mut(), document).map_err(|e| io_error_with_path(e, temp.path()))?;
    temp.persist(path)
        .map_err(|e| io_error_with_path(e.error, path))?;
    debug!("Saved {} bytes to {}", document.len(), path.display());
    Ok(())
}

/// Places `content` on the system clipboard.
#[cfg(feature = "clipboard")]
pub fn copy_to_clipboard(content: &str) -> Result<()> {
    use arboard::Clipboard;
    let mut clipboard =
        Clipboard::new().map_err(|e| ClipboardError::Initialization(e.to_string()))?;
    clipboard
        .set_text(content)
        .map_err(|e| ClipboardError::SetContent(e.to_string()))?;
    debug!("Copied {} bytes to the clipboard", content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_document_to_buffer() -> io::Result<()> {
        let mut buffer = Vec::new();
        write_document(&mut buffer, "## File: a.txt\n")?;
        assert_eq!(buffer, b"## File: a.txt\n");
        Ok(())
    }

    #[test]
    fn test_save_atomic_replaces_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.md");
        fs::write(&path, "old content that is longer").unwrap();
        save_atomic(&path, "new")?;
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // no temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        Ok(())
    }

    #[test]
    fn test_deliver_to_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        deliver("content", &OutputDestination::File(path.clone()))?;
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
        Ok(())
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("doc.md");
        assert!(matches!(
            save_atomic(&path, "x"),
            Err(crate::Error::Io { .. })
        ));
    }
}
