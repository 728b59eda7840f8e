#![forbid(unsafe_code)]

//! Text decoding and line splitting.

use encoding_rs::Encoding;

/// Why a byte buffer could not be decoded with a given encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown encoding label {0:?}")]
    UnknownLabel(String),
    #[error("input is not valid {encoding}")]
    Malformed { encoding: &'static str },
}

/// Turns raw bytes into text for a named encoding.
pub trait TextDecoder {
    /// Decode `bytes` as `label`. Implementations must fail rather than
    /// substitute replacement characters.
    fn decode(&self, bytes: &[u8], label: &str) -> Result<String, DecodeError>;
}

/// Decoder backed by `encoding_rs` (WHATWG labels).
///
/// A byte order mark for the requested encoding is stripped; malformed input
/// is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsDecoder;

impl TextDecoder for EncodingRsDecoder {
    fn decode(&self, bytes: &[u8], label: &str) -> Result<String, DecodeError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| DecodeError::UnknownLabel(label.to_owned()))?;
        let body = match Encoding::for_bom(bytes) {
            Some((bom, len)) if bom == encoding => &bytes[len..],
            _ => bytes,
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or(DecodeError::Malformed {
                encoding: encoding.name(),
            })
    }
}

/// Split `text` into lines on `\n`, `\r`, or `\r\n`.
///
/// Terminators are consumed. A final unterminated fragment is kept as a
/// line; a trailing terminator does not produce an extra empty line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(at) => {
                lines.push(&rest[..at]);
                let skip = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[at + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_terminator_style() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\r\r\n"), vec!["", ""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn lone_cr_before_lf_on_next_line_is_not_merged() {
        assert_eq!(split_lines("x\r\r\ny"), vec!["x", "", "y"]);
    }

    #[test]
    fn decodes_utf8_and_strips_bom() {
        let text = EncodingRsDecoder
            .decode(b"\xEF\xBB\xBFh\xC3\xA9", "utf-8")
            .unwrap();
        assert_eq!(text, "hé");
    }

    #[test]
    fn rejects_malformed_utf8() {
        let err = EncodingRsDecoder.decode(b"caf\xE9", "utf-8").unwrap_err();
        assert_eq!(err, DecodeError::Malformed { encoding: "UTF-8" });
    }

    #[test]
    fn legacy_fallback_accepts_latin_bytes() {
        let text = EncodingRsDecoder.decode(b"caf\xE9", "windows-1252").unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn unknown_label_is_reported() {
        let err = EncodingRsDecoder.decode(b"x", "klingon").unwrap_err();
        assert_eq!(err, DecodeError::UnknownLabel("klingon".into()));
    }
}
