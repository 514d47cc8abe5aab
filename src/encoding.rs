//! Character encoding support for GEDCOM files.
//!
//! GEDCOM files come in several encodings:
//! - **ANSEL** (legacy) - ASCII plus a genealogy-oriented high half with
//!   combining diacritics that precede their base letter
//! - **UTF-8** (modern)
//! - **UTF-16** (`CHAR UNICODE`), little or big endian
//! - **ASCII** and assorted 8-bit code pages, decoded as Windows-1252
//!
//! The encoding is declared in the header by `1 CHAR <name>`, but byte-order
//! marks take precedence. UTF-16 input is converted to UTF-8 up front by
//! [`normalize_source`] so that the line scanner and Stage One only ever see an
//! ASCII-compatible byte stream.

use crate::ansel_tables::get_ansel_character;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Character encoding for GEDCOM data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GedcomEncoding {
    /// ANSEL (Z39.47) with GEDCOM extensions
    Ansel,
    /// UTF-8
    Utf8,
    /// UTF-16 (already converted to UTF-8 by [`normalize_source`])
    Utf16,
    /// 7-bit ASCII
    Ascii,
    /// 8-bit fallback, decoded as Windows-1252 (default when undeclared)
    #[default]
    Latin1,
}

impl GedcomEncoding {
    /// Map a `CHAR` header value to an encoding.
    ///
    /// Unknown or empty values select the 8-bit fallback.
    #[must_use]
    pub fn from_char_value(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ANSEL" => GedcomEncoding::Ansel,
            "UTF-8" | "UTF8" => GedcomEncoding::Utf8,
            "UNICODE" | "UTF-16" | "UTF16" => GedcomEncoding::Utf16,
            "ASCII" | "US-ASCII" => GedcomEncoding::Ascii,
            _ => GedcomEncoding::Latin1,
        }
    }

    /// The canonical `CHAR` value for this encoding.
    #[must_use]
    pub fn as_char_value(&self) -> &'static str {
        match self {
            GedcomEncoding::Ansel => "ANSEL",
            GedcomEncoding::Utf8 => "UTF-8",
            GedcomEncoding::Utf16 => "UNICODE",
            GedcomEncoding::Ascii => "ASCII",
            GedcomEncoding::Latin1 => "ANSI",
        }
    }
}

impl fmt::Display for GedcomEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_char_value())
    }
}

/// Source bytes after byte-order-mark handling.
#[derive(Debug)]
pub struct NormalizedSource<'a> {
    /// ASCII-compatible bytes (BOM removed, UTF-16 converted to UTF-8)
    pub bytes: Cow<'a, [u8]>,
    /// Encoding implied by the BOM or byte layout, if any
    pub detected: Option<GedcomEncoding>,
}

/// Strip any byte-order mark and convert UTF-16 input to UTF-8.
///
/// UTF-16 without a BOM is recognised by the NUL byte interleaved with the
/// leading `0` of `0 HEAD`.
#[must_use]
pub fn normalize_source(raw: &[u8]) -> NormalizedSource<'_> {
    if let Some(rest) = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return NormalizedSource {
            bytes: Cow::Borrowed(rest),
            detected: Some(GedcomEncoding::Utf8),
        };
    }

    let utf16 = match raw {
        [0xFF, 0xFE, rest @ ..] => Some((encoding_rs::UTF_16LE, rest)),
        [0xFE, 0xFF, rest @ ..] => Some((encoding_rs::UTF_16BE, rest)),
        [b, 0, ..] if *b != 0 => Some((encoding_rs::UTF_16LE, raw)),
        [0, b, ..] if *b != 0 => Some((encoding_rs::UTF_16BE, raw)),
        _ => None,
    };

    match utf16 {
        Some((codec, body)) => {
            let (text, _had_errors) = codec.decode_without_bom_handling(body);
            NormalizedSource {
                bytes: Cow::Owned(text.into_owned().into_bytes()),
                detected: Some(GedcomEncoding::Utf16),
            }
        },
        None => NormalizedSource {
            bytes: Cow::Borrowed(raw),
            detected: None,
        },
    }
}

/// Decode a value's bytes using the specified encoding.
///
/// Decoding is lossy: bytes that cannot be mapped become U+FFFD rather than
/// failing the line. Control characters other than line feed and tab are
/// removed.
#[must_use]
pub fn decode_bytes(bytes: &[u8], encoding: GedcomEncoding) -> String {
    let decoded = match encoding {
        GedcomEncoding::Utf8 | GedcomEncoding::Utf16 => String::from_utf8_lossy(bytes).into_owned(),
        GedcomEncoding::Ansel => decode_ansel(bytes),
        GedcomEncoding::Ascii | GedcomEncoding::Latin1 => {
            if bytes.is_ascii() {
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                let (text, _had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
                text.into_owned()
            }
        },
    };
    strip_control_chars(decoded)
}

/// Remove disallowed control characters, keeping `\n` and `\t`.
#[must_use]
pub fn strip_control_chars(value: String) -> String {
    if value
        .chars()
        .all(|c| !c.is_control() || c == '\n' || c == '\t')
    {
        return value;
    }
    value
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect()
}

/// Decode ANSEL bytes to a UTF-8 string.
///
/// ANSEL combining marks come before the character they modify; Unicode wants
/// them after. Marks are buffered until the next base character and then
/// emitted behind it, and the result is NFC normalized.
fn decode_ansel(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    let mut combining_chars: Vec<char> = Vec::new();

    for &byte in bytes {
        if byte < 0x80 {
            if (byte < 0x20 && byte != b'\n' && byte != b'\t') || byte == 0x7F {
                continue;
            }
            result.push(char::from(byte));
            result.extend(combining_chars.drain(..));
            continue;
        }

        match get_ansel_character(byte) {
            Some((code, true)) => {
                combining_chars.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            },
            Some((code, false)) => {
                result.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                result.extend(combining_chars.drain(..));
            },
            // 0x80-0x9F are C1 controls
            None if byte < 0xA0 => {},
            None => {
                result.push('\u{FFFD}');
                result.extend(combining_chars.drain(..));
            },
        }
    }

    // Dangling marks at end of value attach to nothing; keep them visible
    result.extend(combining_chars);

    if result.is_ascii() {
        result
    } else {
        result.nfc().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_display_is_char_value() {
        assert_eq!(GedcomEncoding::Ansel.to_string(), "ANSEL");
        assert_eq!(GedcomEncoding::Utf16.to_string(), "UNICODE");
        assert_eq!(format!("{}", GedcomEncoding::Latin1), "ANSI");
    }

    #[test]
    fn test_encoding_from_char_value() {
        assert_eq!(GedcomEncoding::from_char_value("ANSEL"), GedcomEncoding::Ansel);
        assert_eq!(GedcomEncoding::from_char_value("UTF-8"), GedcomEncoding::Utf8);
        assert_eq!(GedcomEncoding::from_char_value("utf8"), GedcomEncoding::Utf8);
        assert_eq!(GedcomEncoding::from_char_value("UNICODE"), GedcomEncoding::Utf16);
        assert_eq!(GedcomEncoding::from_char_value("IBMPC"), GedcomEncoding::Latin1);
        assert_eq!(GedcomEncoding::from_char_value(""), GedcomEncoding::Latin1);
    }

    #[test]
    fn test_ansel_ascii_passthrough() {
        assert_eq!(decode_bytes(b"Hello, World", GedcomEncoding::Ansel), "Hello, World");
    }

    #[test]
    fn test_ansel_combining_acute_precedes_base() {
        // 0xE2 = combining acute, placed before 'e' in ANSEL
        let decoded = decode_bytes(b"Caf\xE2e", GedcomEncoding::Ansel);
        assert_eq!(decoded, "Caf\u{e9}");
    }

    #[test]
    fn test_ansel_multiple_marks_compose() {
        // diaeresis + macron on 'a' -> U+01DF after NFC
        let decoded = decode_bytes(b"\xE8\xE5a", GedcomEncoding::Ansel);
        assert_eq!(decoded, "a\u{308}\u{304}".nfc().collect::<String>());
    }

    #[test]
    fn test_ansel_spacing_characters() {
        let decoded = decode_bytes(b"\xA1\xB2d\xB5", GedcomEncoding::Ansel);
        assert_eq!(decoded, "\u{141}\u{f8}d\u{e6}");
    }

    #[test]
    fn test_ansel_unassigned_byte_is_replacement() {
        let decoded = decode_bytes(b"A\xAFB", GedcomEncoding::Ansel);
        assert_eq!(decoded, "A\u{FFFD}B");
    }

    #[test]
    fn test_ansel_control_characters_skipped() {
        let decoded = decode_bytes(b"He\x01llo\x85", GedcomEncoding::Ansel);
        assert_eq!(decoded, "Hello");
    }

    #[test]
    fn test_latin1_fallback_uses_windows_1252() {
        // 0xE9 = e acute, 0x80 = euro sign in Windows-1252
        let decoded = decode_bytes(b"Caf\xE9 \x80", GedcomEncoding::Latin1);
        assert_eq!(decoded, "Caf\u{e9} \u{20ac}");
    }

    #[test]
    fn test_utf8_invalid_bytes_are_lossy() {
        let decoded = decode_bytes(b"ok\xFFok", GedcomEncoding::Utf8);
        assert_eq!(decoded, "ok\u{FFFD}ok");
    }

    #[test]
    fn test_control_chars_stripped_but_newline_kept() {
        let decoded = decode_bytes(b"a\nb\x07c\td", GedcomEncoding::Utf8);
        assert_eq!(decoded, "a\nbc\td");
    }

    #[test]
    fn test_normalize_source_strips_utf8_bom() {
        let source = normalize_source(b"\xEF\xBB\xBF0 HEAD");
        assert_eq!(&*source.bytes, b"0 HEAD");
        assert_eq!(source.detected, Some(GedcomEncoding::Utf8));
    }

    #[test]
    fn test_normalize_source_converts_utf16le() {
        let mut raw = vec![0xFF, 0xFE];
        for unit in "0 HEAD\n".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        let source = normalize_source(&raw);
        assert_eq!(&*source.bytes, b"0 HEAD\n");
        assert_eq!(source.detected, Some(GedcomEncoding::Utf16));
    }

    #[test]
    fn test_normalize_source_detects_bomless_utf16be() {
        let mut raw = Vec::new();
        for unit in "0 HEAD".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        let source = normalize_source(&raw);
        assert_eq!(&*source.bytes, b"0 HEAD");
    }

    #[test]
    fn test_normalize_source_plain_ascii_borrowed() {
        let source = normalize_source(b"0 HEAD");
        assert!(matches!(source.bytes, Cow::Borrowed(_)));
        assert_eq!(source.detected, None);
    }
}
