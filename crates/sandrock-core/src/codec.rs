//! Slot text encoding and the fit policy
//!
//! The codec turns slot bytes into text and back. It knows how many bytes
//! each character takes in the file's encoding, which is what makes a
//! capacity-safe truncation possible.

use encoding_rs::{Encoding, ISO_2022_JP, UTF_8};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fill byte used by the shipped localization files
pub const DEFAULT_FILL_BYTE: u8 = 0x00;

/// Codec parameters as they appear in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// WHATWG encoding label (e.g. "utf-8", "shift_jis")
    pub encoding: String,
    /// Byte used for padding (and terminator, if reserved)
    pub fill_byte: u8,
    /// Keep one byte of every slot for a terminator
    pub reserve_terminator: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            fill_byte: DEFAULT_FILL_BYTE,
            reserve_terminator: false,
        }
    }
}

/// Encoded text plus whether any character had to be substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub unmappable: bool,
}

/// Result of forcing text into a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    /// Exactly `capacity` bytes, padded with the fill byte
    pub bytes: Vec<u8>,
    /// The whole-character prefix that was kept
    pub text: String,
    /// Encoded length of the kept text, without padding
    pub encoded_len: usize,
    /// Encoded length of the full input text
    pub required: usize,
    pub truncated: bool,
    pub unmappable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    encoding: &'static Encoding,
    fill_byte: u8,
    reserve_terminator: bool,
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::utf8()
    }
}

impl TextCodec {
    pub fn utf8() -> Self {
        Self {
            encoding: UTF_8,
            fill_byte: DEFAULT_FILL_BYTE,
            reserve_terminator: false,
        }
    }

    pub fn new(config: &CodecConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.encoding.as_bytes()).ok_or_else(|| {
            Error::InvalidConfig(format!("unknown encoding label {:?}", config.encoding))
        })?;

        // UTF-16 and the replacement encoding cannot be produced by the encoder,
        // and ISO-2022-JP is stateful so per-character widths don't add up.
        if encoding.output_encoding() != encoding || encoding == ISO_2022_JP {
            return Err(Error::InvalidConfig(format!(
                "encoding {} cannot be used for fixed-size slots",
                encoding.name()
            )));
        }

        Ok(Self {
            encoding,
            fill_byte: config.fill_byte,
            reserve_terminator: config.reserve_terminator,
        })
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn fill_byte(&self) -> u8 {
        self.fill_byte
    }

    /// Bytes of `capacity` available for text
    pub fn usable_capacity(&self, capacity: usize) -> usize {
        if self.reserve_terminator {
            capacity.saturating_sub(1)
        } else {
            capacity
        }
    }

    /// Decode slot bytes, dropping trailing fill bytes
    ///
    /// Malformed sequences are an error rather than being replaced, so a
    /// decoded slot always re-encodes to the bytes it came from.
    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        let end = raw
            .iter()
            .rposition(|&b| b != self.fill_byte)
            .map_or(0, |i| i + 1);

        self.encoding
            .decode_without_bom_handling_and_without_replacement(&raw[..end])
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                Error::EncodingError(format!("invalid {} byte sequence", self.encoding.name()))
            })
    }

    /// Encode text to its minimal byte sequence, without padding
    pub fn encode(&self, text: &str) -> Encoded {
        let (bytes, _, unmappable) = self.encoding.encode(text);
        Encoded {
            bytes: bytes.into_owned(),
            unmappable,
        }
    }

    pub fn encoded_len(&self, text: &str) -> usize {
        if self.encoding == UTF_8 {
            text.len()
        } else {
            self.encode(text).bytes.len()
        }
    }

    /// Encoded width of a single character
    pub fn char_width(&self, c: char) -> usize {
        if self.encoding == UTF_8 {
            return c.len_utf8();
        }
        let mut buf = [0u8; 4];
        self.encoded_len(c.encode_utf8(&mut buf))
    }

    /// Force `text` into exactly `capacity` bytes
    ///
    /// Text that fits is padded with the fill byte. Text that doesn't is cut
    /// at the last whole character that fits; a character is never split.
    pub fn fit(&self, text: &str, capacity: usize) -> Fitted {
        let usable = self.usable_capacity(capacity);
        let encoded = self.encode(text);
        let required = encoded.bytes.len();

        let (kept, bytes, unmappable) = if required <= usable {
            (text, encoded.bytes, encoded.unmappable)
        } else {
            let mut used = 0usize;
            let mut end = 0usize;
            for (idx, c) in text.char_indices() {
                let width = self.char_width(c);
                if used + width > usable {
                    break;
                }
                used += width;
                end = idx + c.len_utf8();
            }
            let prefix = &text[..end];
            let encoded = self.encode(prefix);
            (prefix, encoded.bytes, encoded.unmappable)
        };

        let encoded_len = bytes.len();
        let mut bytes = bytes;
        bytes.resize(capacity, self.fill_byte);

        Fitted {
            bytes,
            text: kept.to_string(),
            encoded_len,
            required,
            truncated: kept.len() < text.len(),
            unmappable,
        }
    }
}
