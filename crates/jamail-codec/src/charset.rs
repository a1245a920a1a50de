//! Charset conversion between byte strings and Unicode text.
//!
//! Labels are resolved with the WHATWG label set through `encoding_rs`.
//! Conversion streams: [`Decoder`] and [`Encoder`] carry their state across
//! chunks, and [`encode`] / [`decode`] drive them in bounded pieces so that
//! arbitrarily large payloads never need more than one chunk of scratch
//! space beyond the output itself.
//!
//! No byte-order mark is ever written, and a leading BOM on input is not
//! sniffed: it decodes to U+FEFF like any other character.

use std::fmt;

use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_16BE, UTF_16LE};

/// Number of input bytes handed to the transducer per step.
pub const CHUNK_SIZE: usize = 4096;

/// Charset conversion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConvError {
    /// The input cannot be represented in (or is not valid for) the charset.
    #[error("invalid char sequence")]
    InvalidSequence,

    /// The charset label is unknown.
    #[error("init failed")]
    InitFailed,
}

fn lookup(charset: &str) -> Result<&'static Encoding, ConvError> {
    Encoding::for_label_no_replacement(charset.as_bytes()).ok_or(ConvError::InitFailed)
}

/// Streaming decoder from a named charset to UTF-8 text.
pub struct Decoder {
    inner: encoding_rs::Decoder,
}

impl Decoder {
    /// Creates a decoder for the given charset label.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InitFailed`] if the label is unknown.
    pub fn new(charset: &str) -> Result<Self, ConvError> {
        Ok(Self {
            inner: lookup(charset)?.new_decoder_without_bom_handling(),
        })
    }

    /// Decodes one chunk of input.
    ///
    /// A multi-byte sequence split across chunks is carried over to the
    /// next call. Passing `last = true` ends the stream: an unfinished
    /// sequence is then an error, and the decoder is reset so it can be
    /// reused for a new stream.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidSequence`] on malformed input.
    pub fn decode_chunk(&mut self, bytes: &[u8], last: bool) -> Result<String, ConvError> {
        let mut out = String::new();
        let mut input = bytes;
        let result = loop {
            let needed = self
                .inner
                .max_utf8_buffer_length_without_replacement(input.len())
                .ok_or(ConvError::InvalidSequence)?;
            out.reserve(needed);
            let (result, read) = self
                .inner
                .decode_to_string_without_replacement(input, &mut out, last);
            input = &input[read..];
            match result {
                DecoderResult::OutputFull => {}
                DecoderResult::InputEmpty => break Ok(out),
                DecoderResult::Malformed(..) => break Err(ConvError::InvalidSequence),
            }
        };
        if last || result.is_err() {
            self.inner = self.inner.encoding().new_decoder_without_bom_handling();
        }
        result
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("encoding", &self.inner.encoding().name())
            .finish()
    }
}

enum EncoderKind {
    Native(encoding_rs::Encoder),
    // encoding_rs only decodes UTF-16; its encoder falls back to UTF-8.
    Utf16 { big_endian: bool },
}

/// Streaming encoder from UTF-8 text to a named charset.
pub struct Encoder {
    kind: EncoderKind,
}

impl Encoder {
    /// Creates an encoder for the given charset label.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InitFailed`] if the label is unknown.
    pub fn new(charset: &str) -> Result<Self, ConvError> {
        let encoding = lookup(charset)?;
        let kind = if encoding == UTF_16LE {
            EncoderKind::Utf16 { big_endian: false }
        } else if encoding == UTF_16BE {
            EncoderKind::Utf16 { big_endian: true }
        } else {
            EncoderKind::Native(encoding.new_encoder())
        };
        Ok(Self { kind })
    }

    /// Encodes one chunk of text.
    ///
    /// Stateful charsets (ISO-2022-JP) emit their closing shift sequence
    /// when `last` is set; the encoder is then reset for a new stream.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidSequence`] if a character has no
    /// representation in the charset.
    pub fn encode_chunk(&mut self, text: &str, last: bool) -> Result<Vec<u8>, ConvError> {
        match &mut self.kind {
            EncoderKind::Utf16 { big_endian } => Ok(encode_utf16(text, *big_endian)),
            EncoderKind::Native(encoder) => {
                let mut out = Vec::new();
                let mut input = text;
                let result = loop {
                    let needed = encoder
                        .max_buffer_length_from_utf8_without_replacement(input.len())
                        .ok_or(ConvError::InvalidSequence)?;
                    out.reserve(needed);
                    let (result, read) =
                        encoder.encode_from_utf8_to_vec_without_replacement(input, &mut out, last);
                    input = &input[read..];
                    match result {
                        EncoderResult::OutputFull => {}
                        EncoderResult::InputEmpty => break Ok(out),
                        EncoderResult::Unmappable(_) => break Err(ConvError::InvalidSequence),
                    }
                };
                if last || result.is_err() {
                    *encoder = encoder.encoding().new_encoder();
                }
                result
            }
        }
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.kind {
            EncoderKind::Native(encoder) => encoder.encoding().name(),
            EncoderKind::Utf16 { big_endian: false } => UTF_16LE.name(),
            EncoderKind::Utf16 { big_endian: true } => UTF_16BE.name(),
        };
        f.debug_struct("Encoder").field("encoding", &name).finish()
    }
}

fn encode_utf16(text: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        let bytes = if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        out.extend_from_slice(&bytes);
    }
    out
}

/// Converts text to the named charset.
///
/// # Errors
///
/// Returns [`ConvError::InitFailed`] for an unknown charset and
/// [`ConvError::InvalidSequence`] for unrepresentable characters.
pub fn encode(text: &str, charset: &str) -> Result<Vec<u8>, ConvError> {
    let mut encoder = Encoder::new(charset)?;
    let mut out = Vec::with_capacity(text.len());
    let mut rest = text;
    loop {
        let mut end = rest.len().min(CHUNK_SIZE);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        rest = tail;
        let last = rest.is_empty();
        out.extend_from_slice(&encoder.encode_chunk(head, last)?);
        if last {
            return Ok(out);
        }
    }
}

/// Converts bytes in the named charset to text.
///
/// # Errors
///
/// Returns [`ConvError::InitFailed`] for an unknown charset and
/// [`ConvError::InvalidSequence`] for malformed input.
pub fn decode(bytes: &[u8], charset: &str) -> Result<String, ConvError> {
    let mut decoder = Decoder::new(charset)?;
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        let (head, tail) = rest.split_at(rest.len().min(CHUNK_SIZE));
        rest = tail;
        let last = rest.is_empty();
        out.push_str(&decoder.decode_chunk(head, last)?);
        if last {
            return Ok(out);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_utf8_round_trip() {
        let text = "Grüße, Ω and 漢字";
        let bytes = encode(text, "UTF-8").unwrap();
        assert_eq!(bytes, text.as_bytes());
        assert_eq!(decode(&bytes, "UTF-8").unwrap(), text);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        assert_eq!(decode(b"abc", "utf-8").unwrap(), "abc");
        assert_eq!(decode(b"abc", " UTF8 ").unwrap(), "abc");
    }

    #[test]
    fn test_unknown_charset() {
        assert_eq!(encode("x", "no-such-charset"), Err(ConvError::InitFailed));
        assert_eq!(decode(b"x", "no-such-charset"), Err(ConvError::InitFailed));
        assert_eq!(ConvError::InitFailed.to_string(), "init failed");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode(b"ab\xff\xfe", "UTF-8").unwrap_err();
        assert_eq!(err, ConvError::InvalidSequence);
        assert_eq!(err.to_string(), "invalid char sequence");
    }

    #[test]
    fn test_truncated_sequence_at_end() {
        assert_eq!(decode(b"ok\xce", "UTF-8"), Err(ConvError::InvalidSequence));
    }

    #[test]
    fn test_unrepresentable_character() {
        assert_eq!(encode("Ω", "ISO-8859-1"), Err(ConvError::InvalidSequence));
    }

    #[test]
    fn test_single_byte_charset() {
        let bytes = encode("café €", "windows-1252").unwrap();
        assert_eq!(bytes, b"caf\xe9 \x80");
        assert_eq!(decode(&bytes, "windows-1252").unwrap(), "café €");
    }

    #[test]
    fn test_utf16_without_bom() {
        assert_eq!(encode("Aé", "UTF-16LE").unwrap(), vec![0x41, 0x00, 0xe9, 0x00]);
        assert_eq!(encode("Aé", "UTF-16BE").unwrap(), vec![0x00, 0x41, 0x00, 0xe9]);
        assert_eq!(decode(&[0x41, 0x00, 0xe9, 0x00], "UTF-16LE").unwrap(), "Aé");
    }

    #[test]
    fn test_leading_bom_is_kept() {
        assert_eq!(decode(b"\xef\xbb\xbfx", "UTF-8").unwrap(), "\u{feff}x");
    }

    #[test]
    fn test_decoder_carries_split_sequence() {
        let mut decoder = Decoder::new("UTF-8").unwrap();
        // "Ω" is 0xCE 0xA9
        assert_eq!(decoder.decode_chunk(b"a\xce", false).unwrap(), "a");
        assert_eq!(decoder.decode_chunk(b"\xa9b", true).unwrap(), "Ωb");
        // reset after the last chunk
        assert_eq!(decoder.decode_chunk(b"c", true).unwrap(), "c");
    }

    #[test]
    fn test_stateful_encoder_closes_shift() {
        let bytes = encode("日本", "ISO-2022-JP").unwrap();
        assert!(bytes.starts_with(b"\x1b$B"));
        assert!(bytes.ends_with(b"\x1b(B"));
        assert_eq!(decode(&bytes, "ISO-2022-JP").unwrap(), "日本");
    }

    #[test]
    fn test_large_payload_spans_chunks() {
        let text = "Ωx".repeat(CHUNK_SIZE);
        let bytes = encode(&text, "UTF-8").unwrap();
        assert_eq!(bytes.len(), text.len());
        assert_eq!(decode(&bytes, "UTF-8").unwrap(), text);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(encode("", "UTF-8").unwrap(), Vec::<u8>::new());
        assert_eq!(decode(b"", "UTF-8").unwrap(), "");
    }

    proptest! {
        #[test]
        fn prop_utf8_bytes_round_trip(text in any::<String>()) {
            let bytes = text.as_bytes();
            let decoded = decode(bytes, "UTF-8").unwrap();
            prop_assert_eq!(encode(&decoded, "UTF-8").unwrap(), bytes);
        }

        #[test]
        fn prop_utf16_round_trip(text in any::<String>()) {
            let bytes = encode(&text, "UTF-16BE").unwrap();
            prop_assert_eq!(decode(&bytes, "UTF-16BE").unwrap(), text);
        }
    }
}
