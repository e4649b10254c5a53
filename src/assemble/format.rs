// src/assemble/format.rs

use crate::constants::{FILE_HEADER_PREFIX, MIN_FENCE_TICKS};
use std::path::Path;

/// The code fence for `content`: a backtick run one longer than the longest
/// run inside the content, and never shorter than three.
///
/// # Examples
/// ```
/// use foldcat::assemble::fence_for;
///
/// assert_eq!(fence_for("plain"), "```");
/// assert_eq!(fence_for("has ```` inside"), "`````");
/// ```
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(MIN_FENCE_TICKS))
}

/// The language hint placed after the opening fence: the file extension,
/// or nothing when the extension could be mistaken for part of the fence.
pub fn language_hint(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            ext.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
        })
        .unwrap_or("")
}

/// Renders one file block.
///
/// A block for content of `L` lines is exactly `L + 4` lines long: the
/// header, the opening fence, the content, the closing fence and one empty
/// line. Every line, including the last, ends with `\n`.
pub fn render_block(path: &str, content: &str) -> String {
    let fence = fence_for(content);
    let mut block = String::with_capacity(content.len() + path.len() + 32);
    block.push_str(FILE_HEADER_PREFIX);
    block.push_str(path);
    block.push('\n');
    block.push_str(&fence);
    block.push_str(language_hint(path));
    block.push('\n');
    for line in content.lines() {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str(&fence);
    block.push_str("\n\n");
    block
}

/// Splits a document back into `(path, content)` pairs.
///
/// Content comes back with lines joined by `\n` and no trailing newline, so
/// it matches the original up to a single trailing newline. Text outside
/// well-formed blocks is ignored.
///
/// # Examples
/// ```
/// use foldcat::assemble::{parse_document, render_block};
///
/// let doc = format!("{}{}", render_block("a.txt", "hello\n"), render_block("b/c.rs", "fn x() {}"));
/// let files = parse_document(&doc);
/// assert_eq!(files[0], ("a.txt".to_string(), "hello".to_string()));
/// assert_eq!(files[1].0, "b/c.rs");
/// ```
pub fn parse_document(document: &str) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let mut lines = document.lines();

    while let Some(line) = lines.next() {
        let Some(path) = line.strip_prefix(FILE_HEADER_PREFIX) else {
            continue;
        };
        let Some(fence) = lines.next().map(opening_fence) else {
            break;
        };
        if fence.len() < MIN_FENCE_TICKS {
            continue;
        }
        let mut content: Vec<&str> = Vec::new();
        let mut closed = false;
        for body_line in lines.by_ref() {
            if body_line == fence {
                closed = true;
                break;
            }
            content.push(body_line);
        }
        if closed {
            files.push((path.to_string(), content.join("\n")));
        }
    }
    files
}

/// Extracts the content of a single rendered block.
pub fn parse_block(block: &str) -> Option<String> {
    parse_document(block).into_iter().next().map(|(_, content)| content)
}

fn opening_fence(line: &str) -> &str {
    let ticks = line.chars().take_while(|&c| c == '`').count();
    &line[..ticks]
}
