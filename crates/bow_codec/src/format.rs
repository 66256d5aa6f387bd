//! Codec format tags.

use crate::error::CodecError;
use std::fmt;
use std::str::FromStr;

/// Identifies the encoding a codec produces.
///
/// The tag byte is recorded once in the store file header. It is not
/// stored per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Format {
    /// CBOR (RFC 8949), a compact binary format.
    Cbor = 1,
    /// JSON text.
    Json = 2,
}

impl Format {
    /// All known formats.
    pub const ALL: [Format; 2] = [Format::Cbor, Format::Json];

    /// Returns the tag byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Converts a tag byte to a format.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Cbor),
            2 => Some(Self::Json),
            _ => None,
        }
    }

    /// Returns the lower-case format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cbor => "cbor",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::UnknownFormat(s.to_string()))
    }
}
