//! # bow codec
//!
//! Pluggable encode/decode contract for bow records.
//!
//! A database selects exactly one [`Codec`] when it is opened and uses it
//! for every record in every bucket. The codec's [`Format`] tag is written
//! once into the store file header; records themselves carry no tag, so
//! bytes written by a different codec fail to decode with a [`CodecError`]
//! rather than being misinterpreted.
//!
//! ## Available Codecs
//!
//! - [`CborCodec`] - compact binary CBOR (the default)
//! - [`JsonCodec`] - JSON text
//! - [`FormatCodec`] - either of the above, chosen at runtime by tag
//!
//! ## Usage
//!
//! ```
//! use bow_codec::{Codec, CborCodec};
//!
//! let bytes = CborCodec.marshal(&("arrow", 10u32)).unwrap();
//! let decoded: (String, u32) = CborCodec.unmarshal(&bytes).unwrap();
//! assert_eq!(decoded, ("arrow".to_string(), 10));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod format;
mod json;

pub use cbor::CborCodec;
pub use error::{CodecError, CodecResult};
pub use format::Format;
pub use json::JsonCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A stateless marshal/unmarshal pair identified by a format tag.
///
/// The serde bounds push "this type has no serialization support" to
/// compile time. What remains at runtime (a `Serialize` impl that refuses a
/// value, or bytes that do not describe the target type) is reported as a
/// typed [`CodecError`].
pub trait Codec: Send + Sync + 'static {
    /// Returns the format this codec produces.
    fn format(&self) -> Format;

    /// Encodes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unsupported`] if the value cannot be represented.
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>>;

    /// Decodes bytes into a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] or [`CodecError::Truncated`] if the
    /// bytes are not a complete encoding of `T`.
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T>;
}

/// A codec whose format is chosen at runtime.
///
/// Used when the codec comes from textual configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCodec {
    format: Format,
}

impl FormatCodec {
    /// Creates a codec for the given format.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }
}

impl Default for FormatCodec {
    fn default() -> Self {
        Self::new(Format::Cbor)
    }
}

impl From<Format> for FormatCodec {
    fn from(format: Format) -> Self {
        Self::new(format)
    }
}

impl Codec for FormatCodec {
    fn format(&self) -> Format {
        self.format
    }

    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        match self.format {
            Format::Cbor => CborCodec.marshal(value),
            Format::Json => JsonCodec.marshal(value),
        }
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T> {
        match self.format {
            Format::Cbor => CborCodec.unmarshal(bytes),
            Format::Json => JsonCodec.unmarshal(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Arrow {
        id: String,
        length: i64,
        sharpness: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Quiver {
        id: i64,
        arrows: Vec<Arrow>,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("no serialization support for this value"))
        }
    }

    fn codecs() -> [FormatCodec; 2] {
        [FormatCodec::new(Format::Cbor), FormatCodec::new(Format::Json)]
    }

    #[test]
    fn format_codec_dispatches() {
        assert_eq!(FormatCodec::default().format(), Format::Cbor);
        let json = FormatCodec::from(Format::Json);
        assert_eq!(json.marshal(&1u8).unwrap(), b"1".to_vec());
    }

    #[test]
    fn refusing_serialize_impl_is_unsupported_in_every_format() {
        for codec in codecs() {
            let err = codec.marshal(&Unserializable).unwrap_err();
            assert!(err.is_marshal(), "{err}");
            assert!(err.to_string().contains("Unserializable"));
        }
    }

    #[test]
    fn bytes_from_other_codec_fail_cleanly() {
        let quiver = Quiver {
            id: 7,
            arrows: vec![Arrow {
                id: "123".into(),
                length: 10,
                sharpness: 0.97,
            }],
        };

        let json = JsonCodec.marshal(&quiver).unwrap();
        let as_cbor: CodecResult<Quiver> = CborCodec.unmarshal(&json);
        assert!(as_cbor.unwrap_err().is_unmarshal());

        let cbor = CborCodec.marshal(&quiver).unwrap();
        let as_json: CodecResult<Quiver> = JsonCodec.unmarshal(&cbor);
        assert!(as_json.unwrap_err().is_unmarshal());
    }

    fn arrow_strategy() -> impl Strategy<Value = Arrow> {
        (".{0,16}", any::<i64>(), 0u32..100_000).prop_map(|(id, length, quarters)| Arrow {
            id,
            length,
            sharpness: f64::from(quarters) / 4.0,
        })
    }

    proptest! {
        #[test]
        fn roundtrip_every_format(id in any::<i64>(), arrows in prop::collection::vec(arrow_strategy(), 0..4)) {
            let quiver = Quiver { id, arrows };
            for codec in codecs() {
                let bytes = codec.marshal(&quiver).unwrap();
                let decoded: Quiver = codec.unmarshal(&bytes).unwrap();
                prop_assert_eq!(&decoded, &quiver);
            }
        }
    }
}
