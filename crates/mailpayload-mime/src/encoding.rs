//! Transfer decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 encoded-words in header
//! values and charset conversion to UTF-8. Only decoding lives here, plus
//! the Base64 encoder used to ship attachment bytes.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64 (standard alphabet, padded, no line breaks).
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable text (RFC 2045) into raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => {
                i += 3;
                continue;
            }
            Some([b'\n', _]) => {
                i += 2;
                continue;
            }
            _ => {}
        }
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::QuotedPrintable("Incomplete escape sequence".to_string()))?;
        let (Some(high), Some(low)) = (hex_value(hex[0]), hex_value(hex[1])) else {
            return Err(Error::QuotedPrintable(format!(
                "Invalid hex escape: ={}",
                String::from_utf8_lossy(hex)
            )));
        };
        result.push((high << 4) | low);
        i += 3;
    }

    Ok(result)
}

/// Value of one hex digit; `None` for anything else, including `+` and `-`.
fn hex_value(byte: u8) -> Option<u8> {
    if !byte.is_ascii_hexdigit() {
        return None;
    }
    char::from(byte)
        .to_digit(16)
        .and_then(|digit| u8::try_from(digit).ok())
}

/// Decodes every RFC 2047 encoded-word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded-words is dropped; plain text is kept as is. Words that
/// fail to decode are left untouched.
#[must_use]
pub fn decode_encoded_words(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = String::new();
    let mut last_was_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        let Some((decoded, consumed)) = decode_word(candidate) else {
            result.push_str(&pending_space);
            pending_space.clear();
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
            last_was_word = false;
            continue;
        };

        let between_words = last_was_word && before.chars().all(char::is_whitespace);
        if !between_words {
            result.push_str(&pending_space);
            result.push_str(before);
        }
        pending_space.clear();
        result.push_str(&decoded);
        rest = &candidate[consumed..];
        last_was_word = true;

        let trailing = rest.len() - rest.trim_start().len();
        pending_space.push_str(&rest[..trailing]);
        rest = &rest[trailing..];
    }

    result.push_str(&pending_space);
    result.push_str(rest);
    result
}

/// Decodes a single encoded-word at the start of `text`.
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_word(text: &str) -> Option<(String, usize)> {
    let inner = text.strip_prefix("=?")?;
    let (charset, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let end = inner.find("?=")?;
    let payload = &inner[..end];
    if payload.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(payload).ok()?,
        "Q" => decode_quoted_printable(&payload.replace('_', " ")).ok()?,
        _ => return None,
    };

    // RFC 2231 allows a language suffix: `iso-8859-1*en`
    let label = charset.split('*').next().unwrap_or(charset);
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(label, &bytes), consumed))
}

/// Decodes bytes in the named charset.
///
/// UTF-8 and US-ASCII are read as UTF-8. Other labels go through
/// `encoding_rs`; an unknown label falls back to lossy UTF-8.
#[must_use]
pub fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let label = charset.trim().to_ascii_lowercase();
    if matches!(label.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            tracing::debug!(charset, "Replaced malformed sequences while decoding");
        }
        return decoded.into_owned();
    }
    tracing::warn!(charset, "Unknown charset, falling back to UTF-8");
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable("Hello, World!").unwrap();
        assert_eq!(decoded, b"Hello, World!");

        let decoded = decode_quoted_printable("H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable("Hello=\r\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");

        let decoded = decode_quoted_printable("Hello=\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_incomplete_escape() {
        assert!(decode_quoted_printable("broken=4").is_err());
    }

    #[test]
    fn test_quoted_printable_rejects_signed_hex() {
        assert!(decode_quoted_printable("a=+5b").is_err());
        assert!(decode_quoted_printable("a=-1b").is_err());
        assert_eq!(decode_quoted_printable("a=3db").unwrap(), b"a=b");
    }

    #[test]
    fn test_decode_charset_latin1() {
        assert_eq!(decode_charset("ISO-8859-1", b"caf\xe9"), "café");
        assert_eq!(decode_charset("windows-1252", b"\x93hi\x94"), "\u{201c}hi\u{201d}");
        assert_eq!(decode_charset("utf-8", "café".as_bytes()), "café");
    }

    #[test]
    fn test_decode_charset_unknown_label() {
        assert_eq!(decode_charset("x-made-up", b"plain"), "plain");
    }

    #[test]
    fn test_encoded_words_latin1() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
        assert_eq!(decode_encoded_words("=?iso-8859-1?B?UmVu6Q==?="), "René");
        assert_eq!(decode_encoded_words("=?ISO-8859-1*fr?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_encoded_words_plain_text() {
        assert_eq!(decode_encoded_words("Hello"), "Hello");
    }

    #[test]
    fn test_encoded_words_base64() {
        assert_eq!(decode_encoded_words("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_encoded_words_quoted_printable() {
        assert_eq!(decode_encoded_words("=?UTF-8?Q?H=C3=A9llo_there?="), "Héllo there");
    }

    #[test]
    fn test_encoded_words_mixed_with_text() {
        assert_eq!(
            decode_encoded_words("Re: =?utf-8?B?SMOpbGxv?= =?utf-8?Q?_w=C3=B6rld?= !"),
            "Re: Héllo wörld !"
        );
    }

    #[test]
    fn test_encoded_words_malformed_left_alone() {
        assert_eq!(decode_encoded_words("a =?broken b"), "a =?broken b");
    }
}
