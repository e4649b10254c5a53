// src/config/parsing.rs

use anyhow::{anyhow, Context, Result};
use byte_unit::Byte;
use encoding_rs::Encoding;
use std::str::FromStr;

/// Parses a human size string such as "512k" or "2MiB" into bytes.
pub(super) fn parse_max_size(max_size_str: &str) -> Result<u64> {
    Byte::from_str(max_size_str)
        .map(|b| b.as_u64())
        .with_context(|| format!("Invalid size format: '{}'", max_size_str))
}

/// Resolves an encoding label through the WHATWG label table.
pub(super) fn parse_encoding(label: &str) -> Result<&'static Encoding> {
    crate::processing::decode::encoding_for_label(label)
        .ok_or_else(|| anyhow!("Unknown encoding label: '{}'", label))
}

/// Checks that a ratio lies in the closed unit interval.
pub(super) fn parse_ratio(ratio: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(anyhow!("Binary ratio must be between 0.0 and 1.0, got {}", ratio))
    }
}
