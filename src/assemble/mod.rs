//! Builds the unified document and its position index from a finished tree.
//!
//! The document is the concatenation of one block per text file, in
//! depth-first tree order (see [`render_block`] for the layout). Nothing sits
//! between or around blocks, so the recorded spans tile the document exactly.
//! After ingestion the document only changes through [`Assembly::splice`]
//! and [`Assembly::remove`], which patch the index instead of rebuilding it.

use crate::cancellation::CancellationToken;
use crate::errors::{Error, Result};
use crate::tree::FileTree;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

mod format;
mod index;

pub use format::{fence_for, language_hint, parse_block, parse_document, render_block};
pub use index::{Delta, FileSpan, PositionIndex, Shift};

/// The single linear text buffer produced by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledDocument {
    text: String,
    line_count: usize,
    char_count: usize,
}

impl AssembledDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of `\n`-terminated lines.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Length in Unicode scalar values.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// A document together with its position index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    pub document: AssembledDocument,
    pub index: PositionIndex,
}

/// Concatenates the text of every text file in `tree`, in tree order.
///
/// `texts` maps a file node's full path to its extracted text. The token is
/// checked before each block.
///
/// # Errors
/// Only [`Error::Interrupted`].
pub fn assemble(
    tree: &FileTree,
    texts: &HashMap<String, String>,
    token: &CancellationToken,
) -> Result<Assembly> {
    let mut assembly = Assembly::default();
    for node in tree.files() {
        if !node.has_text() {
            continue;
        }
        token.check()?;
        let Some(text) = texts.get(&node.full_path) else {
            debug!("No text recorded for {}, skipping block", node.full_path);
            continue;
        };
        assembly.append(&node.full_path, text);
    }
    debug!(
        "Assembled {} blocks: {} lines, {} chars",
        assembly.index.len(),
        assembly.document.line_count,
        assembly.document.char_count
    );
    Ok(assembly)
}

impl Assembly {
    fn append(&mut self, path: &str, content: &str) {
        let block = render_block(path, content);
        let doc = &mut self.document;
        let span = FileSpan {
            path: path.to_string(),
            start_line: doc.line_count,
            end_line: doc.line_count + block_lines(&block),
            start_offset: doc.char_count,
            end_offset: doc.char_count + block.chars().count(),
            start_byte: doc.text.len(),
            end_byte: doc.text.len() + block.len(),
        };
        doc.line_count = span.end_line;
        doc.char_count = span.end_offset;
        doc.text.push_str(&block);
        self.index.push(span);
    }

    /// The rendered block of `path`, header and fences included.
    pub fn block(&self, path: &str) -> Option<&str> {
        let span = self.index.get(path)?;
        self.document.text.get(span.start_byte..span.end_byte)
    }

    /// The content of `path` as it currently appears in the document.
    pub fn file_text(&self, path: &str) -> Option<String> {
        self.block(path).and_then(parse_block)
    }

    /// Replaces the block of `path` with one rendered from `new_text` and
    /// shifts every later span. Earlier spans are untouched.
    ///
    /// # Errors
    /// [`Error::UnknownPath`] if `path` has no block.
    pub fn splice(&mut self, path: &str, new_text: &str) -> Result<Delta> {
        let position = self
            .index
            .position(path)
            .ok_or_else(|| Error::UnknownPath(path.to_string()))?;
        let old = self.index.spans()[position].clone();
        let normalized = crate::processing::decode::normalize_line_endings(new_text);
        let block = render_block(path, &normalized);

        let new_lines = block_lines(&block);
        let new_chars = block.chars().count();
        let delta = Delta {
            lines: Shift::between(old.line_count(), new_lines),
            chars: Shift::between(old.char_count(), new_chars),
            bytes: Shift::between(old.byte_len(), block.len()),
        };
        let replacement = FileSpan {
            end_line: old.start_line + new_lines,
            end_offset: old.start_offset + new_chars,
            end_byte: old.start_byte + block.len(),
            ..old.clone()
        };

        let doc = &mut self.document;
        doc.text.replace_range(old.start_byte..old.end_byte, &block);
        doc.line_count = (doc.line_count as i64 + delta.lines.0) as usize;
        doc.char_count = (doc.char_count as i64 + delta.chars.0) as usize;
        self.index.patch(position, replacement, &delta);
        debug!("Spliced {}: {:?}", path, delta);
        Ok(delta)
    }

    /// Drops the blocks of every path in `paths` and closes the gaps in a
    /// single pass. Paths without a block are ignored. Returns the number
    /// of blocks removed.
    pub fn remove<S: AsRef<str>>(&mut self, paths: &[S]) -> usize {
        let doomed: HashSet<&str> = paths.iter().map(|p| p.as_ref()).collect();
        let before = self.index.len();
        if !self.index.spans().iter().any(|s| doomed.contains(s.path.as_str())) {
            return 0;
        }

        let old_text = std::mem::take(&mut self.document.text);
        let old_index = std::mem::take(&mut self.index);
        self.document = AssembledDocument {
            text: String::with_capacity(old_text.len()),
            ..AssembledDocument::default()
        };

        for span in old_index.into_spans() {
            if doomed.contains(span.path.as_str()) {
                continue;
            }
            let doc = &mut self.document;
            let moved = FileSpan {
                start_line: doc.line_count,
                end_line: doc.line_count + span.line_count(),
                start_offset: doc.char_count,
                end_offset: doc.char_count + span.char_count(),
                start_byte: doc.text.len(),
                end_byte: doc.text.len() + span.byte_len(),
                path: span.path,
            };
            doc.text.push_str(&old_text[span.start_byte..span.end_byte]);
            doc.line_count = moved.end_line;
            doc.char_count = moved.end_offset;
            self.index.push(moved);
        }
        before - self.index.len()
    }

    /// Whether the index exactly tiles the document.
    pub fn is_consistent(&self) -> bool {
        self.index.tiles(
            self.document.line_count,
            self.document.char_count,
            self.document.text.len(),
        )
    }
}

fn block_lines(block: &str) -> usize {
    block.bytes().filter(|&b| b == b'\n').count()
}
