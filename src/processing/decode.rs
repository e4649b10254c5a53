// src/processing/decode.rs

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// Text produced by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Decoded text with `\n` line endings.
    pub text: String,
    /// Name of the encoding that was used.
    pub encoding: &'static str,
    /// `true` if some byte sequences were replaced with U+FFFD.
    pub lossy: bool,
}

/// Decodes raw bytes into normalized text. Never fails.
///
/// The encoding is chosen in this order: a byte order mark, UTF-8 when the
/// bytes are valid UTF-8, the declared `fallback` encoding, and finally lossy
/// UTF-8. Invalid sequences become U+FFFD and set [`Decoded::lossy`].
///
/// # Examples
/// ```
/// use foldcat::processing::decode::decode;
///
/// let decoded = decode(b"one\r\ntwo\rthree", None);
/// assert_eq!(decoded.text, "one\ntwo\nthree");
/// assert!(!decoded.lossy);
///
/// let latin1 = decode(&[b'c', b'a', b'f', 0xE9], encoding_rs::Encoding::for_label(b"latin1"));
/// assert_eq!(latin1.text, "café");
/// ```
pub fn decode(bytes: &[u8], fallback: Option<&'static Encoding>) -> Decoded {
    let (text, encoding, lossy) = if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (cow, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        (cow, encoding, had_errors)
    } else if let Ok(text) = std::str::from_utf8(bytes) {
        (Cow::Borrowed(text), UTF_8, false)
    } else {
        let encoding = fallback.unwrap_or(UTF_8);
        let (cow, had_errors) = encoding.decode_without_bom_handling(bytes);
        (cow, encoding, had_errors)
    };

    Decoded {
        text: normalize_line_endings(&text).into_owned(),
        encoding: encoding.name(),
        lossy,
    }
}

/// Rewrites `\r\n` and lone `\r` as `\n`.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Resolves an encoding label such as `"latin1"` or `"shift_jis"`.
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8_passes_through() {
        let decoded = decode("grüße\n".as_bytes(), None);
        assert_eq!(decoded.text, "grüße\n");
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let decoded = decode(&[0xEF, 0xBB, 0xBF, b'h', b'i'], None);
        assert_eq!(decoded.text, "hi");
    }

    #[test]
    fn test_utf16le_with_bom() {
        let bytes = [0xFF, 0xFE, b'h', 0x00, b'i', 0x00, b'\r', 0x00, b'\n', 0x00];
        let decoded = decode(&bytes, None);
        assert_eq!(decoded.text, "hi\n");
        assert_eq!(decoded.encoding, "UTF-16LE");
    }

    #[test]
    fn test_invalid_utf8_without_fallback_is_lossy() {
        let decoded = decode(&[b'a', 0xFF, b'b'], None);
        assert_eq!(decoded.text, "a\u{FFFD}b");
        assert!(decoded.lossy);
    }

    #[test]
    fn test_declared_fallback_is_used() {
        let decoded = decode(&[0x93, b'q', 0x94], encoding_for_label("windows-1252"));
        assert_eq!(decoded.text, "\u{201C}q\u{201D}");
        assert_eq!(decoded.encoding, "windows-1252");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unknown_label() {
        assert!(encoding_for_label("no-such-encoding").is_none());
        assert!(encoding_for_label(" Latin1 ").is_some());
    }
}
