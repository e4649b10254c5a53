// src/processing/classify.rs

use content_inspector::ContentType;
use serde::{Deserialize, Serialize};
use std::str;

/// The verdict of the text/binary classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Decodable text.
    Text,
    /// Binary content; contributes no text.
    Binary,
    /// Larger than the size threshold. Treated as binary without being read.
    Oversized,
    /// Printable but not UTF-8 and without a BOM: probably a legacy 8-bit
    /// encoding. Decoded only when a fallback encoding is configured.
    Unknown,
}

impl Classification {
    pub fn is_binary(self) -> bool {
        matches!(self, Classification::Binary | Classification::Oversized)
    }
}

/// Thresholds used by [`classify`].
#[derive(Debug, Clone, Copy)]
pub struct ClassifyLimits {
    pub max_file_size: u64,
    pub sample_size: usize,
    pub binary_ratio: f32,
}

/// Classifies content from its declared size and a prefix of its bytes.
///
/// Only the first `sample_size` bytes of `bytes` are inspected. The size check
/// comes first, so callers may pass an empty slice when `size` alone already
/// exceeds the threshold.
///
/// # Examples
/// ```
/// use foldcat::processing::classify::{classify, Classification, ClassifyLimits};
///
/// let limits = ClassifyLimits { max_file_size: 1024, sample_size: 512, binary_ratio: 0.3 };
/// assert_eq!(classify(b"plain text\n", 11, &limits), Classification::Text);
/// assert_eq!(classify(b"nul \0 byte", 10, &limits), Classification::Binary);
/// assert_eq!(classify(b"", 4096, &limits), Classification::Oversized);
/// ```
pub fn classify(bytes: &[u8], size: u64, limits: &ClassifyLimits) -> Classification {
    if size > limits.max_file_size {
        return Classification::Oversized;
    }
    let sample = &bytes[..bytes.len().min(limits.sample_size)];

    match content_inspector::inspect(sample) {
        ContentType::UTF_8_BOM
        | ContentType::UTF_16LE
        | ContentType::UTF_16BE
        | ContentType::UTF_32LE
        | ContentType::UTF_32BE => return Classification::Text,
        ContentType::BINARY => return Classification::Binary,
        _ => {}
    }

    if control_byte_ratio(sample) > limits.binary_ratio {
        return Classification::Binary;
    }

    // A multibyte sequence cut off by the sample boundary is still valid UTF-8.
    let truncated = sample.len() < bytes.len();
    match str::from_utf8(sample) {
        Ok(_) => Classification::Text,
        Err(e) if e.error_len().is_none() && truncated => Classification::Text,
        Err(_) => Classification::Unknown,
    }
}

/// Share of bytes that are C0 control characters other than common whitespace.
fn control_byte_ratio(sample: &[u8]) -> f32 {
    if sample.is_empty() {
        return 0.0;
    }
    let control = sample
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c | 0x1b)) || b == 0x7f)
        .count();
    control as f32 / sample.len() as f32
}
