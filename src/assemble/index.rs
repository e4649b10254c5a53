use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where one file's block sits in the document. All ranges are half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpan {
    pub path: String,
    /// Zero-based first line of the block.
    pub start_line: usize,
    pub end_line: usize,
    /// Offsets in Unicode scalar values.
    pub start_offset: usize,
    pub end_offset: usize,
    /// Byte offsets, used for splicing.
    pub start_byte: usize,
    pub end_byte: usize,
}

impl FileSpan {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }

    pub fn char_count(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn byte_len(&self) -> usize {
        self.end_byte - self.start_byte
    }

    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..self.end_line).contains(&line)
    }

    /// Moves the whole span by `delta`.
    pub(super) fn shift(&mut self, delta: &Delta) {
        self.start_line = delta.lines.apply(self.start_line);
        self.end_line = delta.lines.apply(self.end_line);
        self.start_offset = delta.chars.apply(self.start_offset);
        self.end_offset = delta.chars.apply(self.end_offset);
        self.start_byte = delta.bytes.apply(self.start_byte);
        self.end_byte = delta.bytes.apply(self.end_byte);
    }
}

/// A signed change in one dimension of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shift(pub i64);

impl Shift {
    pub fn between(old: usize, new: usize) -> Self {
        Shift(new as i64 - old as i64)
    }

    fn apply(self, value: usize) -> usize {
        (value as i64 + self.0) as usize
    }
}

/// How much a splice moved everything after the edited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    pub lines: Shift,
    pub chars: Shift,
    pub bytes: Shift,
}

/// Ordered spans of every text file in the document, with lookup by path.
///
/// Spans are contiguous and in tree traversal order: the first starts at 0
/// and each one starts where the previous ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FileSpan>", into = "Vec<FileSpan>")]
pub struct PositionIndex {
    spans: Vec<FileSpan>,
    by_path: HashMap<String, usize>,
}

impl From<Vec<FileSpan>> for PositionIndex {
    fn from(spans: Vec<FileSpan>) -> Self {
        let by_path = spans
            .iter()
            .enumerate()
            .map(|(i, span)| (span.path.clone(), i))
            .collect();
        Self { spans, by_path }
    }
}

impl From<PositionIndex> for Vec<FileSpan> {
    fn from(index: PositionIndex) -> Self {
        index.spans
    }
}

impl PositionIndex {
    pub fn get(&self, path: &str) -> Option<&FileSpan> {
        self.by_path.get(path).map(|&i| &self.spans[i])
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    pub fn spans(&self) -> &[FileSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The span covering document line `line`, if any.
    pub fn span_at_line(&self, line: usize) -> Option<&FileSpan> {
        let i = self.spans.partition_point(|span| span.end_line <= line);
        self.spans.get(i).filter(|span| span.contains_line(line))
    }

    /// Whether the spans exactly tile a document of the given size.
    pub fn tiles(&self, lines: usize, chars: usize, bytes: usize) -> bool {
        let mut expected = (0, 0, 0);
        for span in &self.spans {
            if (span.start_line, span.start_offset, span.start_byte) != expected {
                return false;
            }
            expected = (span.end_line, span.end_offset, span.end_byte);
        }
        expected == (lines, chars, bytes)
    }

    pub(super) fn push(&mut self, span: FileSpan) {
        self.by_path.insert(span.path.clone(), self.spans.len());
        self.spans.push(span);
    }

    /// Replaces the span at `position` and shifts every later span.
    pub(super) fn patch(&mut self, position: usize, replacement: FileSpan, delta: &Delta) {
        self.spans[position] = replacement;
        for span in &mut self.spans[position + 1..] {
            span.shift(delta);
        }
    }

    pub(super) fn into_spans(self) -> Vec<FileSpan> {
        self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(path: &str, lines: (usize, usize), chars: (usize, usize)) -> FileSpan {
        FileSpan {
            path: path.to_string(),
            start_line: lines.0,
            end_line: lines.1,
            start_offset: chars.0,
            end_offset: chars.1,
            start_byte: chars.0,
            end_byte: chars.1,
        }
    }

    fn sample() -> PositionIndex {
        PositionIndex::from(vec![
            span("a", (0, 5), (0, 40)),
            span("b", (5, 9), (40, 70)),
            span("c", (9, 15), (70, 120)),
        ])
    }

    #[test]
    fn test_lookup_and_tiling() {
        let index = sample();
        assert_eq!(index.get("b").map(|s| s.start_line), Some(5));
        assert_eq!(index.position("c"), Some(2));
        assert!(index.get("missing").is_none());
        assert!(index.tiles(15, 120, 120));
        assert!(!index.tiles(16, 120, 120));
    }

    #[test]
    fn test_span_at_line() {
        let index = sample();
        assert_eq!(index.span_at_line(0).map(|s| s.path.as_str()), Some("a"));
        assert_eq!(index.span_at_line(5).map(|s| s.path.as_str()), Some("b"));
        assert_eq!(index.span_at_line(14).map(|s| s.path.as_str()), Some("c"));
        assert!(index.span_at_line(15).is_none());
    }

    #[test]
    fn test_patch_shifts_later_spans_only() {
        let mut index = sample();
        let delta = Delta {
            lines: Shift(2),
            chars: Shift(-10),
            bytes: Shift(-10),
        };
        index.patch(1, span("b", (5, 11), (40, 60)), &delta);
        assert_eq!(index.get("a"), Some(&span("a", (0, 5), (0, 40))));
        assert_eq!(index.get("c"), Some(&span("c", (11, 17), (60, 110))));
        assert!(index.tiles(17, 110, 110));
    }

    #[test]
    fn test_serde_rebuilds_lookup() {
        let index = sample();
        let json = serde_json::to_string(&index).unwrap();
        let restored: PositionIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.position("c"), Some(2));
        assert_eq!(restored, index);
    }
}
