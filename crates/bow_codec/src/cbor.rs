//! CBOR codec backed by `ciborium`.

use crate::error::{CodecError, CodecResult};
use crate::format::Format;
use crate::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Binary codec writing one CBOR data item per record.
///
/// This is the default codec of a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn format(&self) -> Format {
        Format::Cbor
    }

    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(|e| match e {
            ciborium::ser::Error::Io(io) => CodecError::unsupported::<T>(Format::Cbor, io.to_string()),
            ciborium::ser::Error::Value(message) => CodecError::unsupported::<T>(Format::Cbor, message),
        })?;
        Ok(buf)
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T> {
        let mut reader = bytes;
        let value = ciborium::from_reader(&mut reader).map_err(|e| match e {
            ciborium::de::Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                CodecError::truncated::<T>(Format::Cbor)
            }
            ciborium::de::Error::Io(io) => CodecError::malformed::<T>(Format::Cbor, io.to_string()),
            ciborium::de::Error::Syntax(offset) => {
                CodecError::malformed::<T>(Format::Cbor, format!("syntax error at offset {offset}"))
            }
            ciborium::de::Error::Semantic(_, message) => {
                CodecError::malformed::<T>(Format::Cbor, message)
            }
            ciborium::de::Error::RecursionLimitExceeded => {
                CodecError::malformed::<T>(Format::Cbor, "recursion limit exceeded")
            }
        })?;

        if !reader.is_empty() {
            return Err(CodecError::malformed::<T>(
                Format::Cbor,
                format!("{} trailing bytes after value", reader.len()),
            ));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Arrow {
        id: String,
        length: i64,
        sharpness: f64,
    }

    fn arrow() -> Arrow {
        Arrow {
            id: "123".into(),
            length: 10,
            sharpness: 0.97,
        }
    }

    #[test]
    fn roundtrip_struct() {
        let bytes = CborCodec.marshal(&arrow()).unwrap();
        let decoded: Arrow = CborCodec.unmarshal(&bytes).unwrap();
        assert_eq!(decoded, arrow());
    }

    #[test]
    fn truncated_input_is_reported() {
        let bytes = CborCodec.marshal(&arrow()).unwrap();
        let result: CodecResult<Arrow> = CborCodec.unmarshal(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(CodecError::Truncated { .. })));

        let result: CodecResult<Arrow> = CborCodec.unmarshal(&[]);
        assert!(matches!(result, Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = CborCodec.marshal(&arrow()).unwrap();
        bytes.push(0x00);
        let result: CodecResult<Arrow> = CborCodec.unmarshal(&bytes);
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn mismatched_target_type_is_malformed() {
        let bytes = CborCodec.marshal(&vec![1u8, 2, 3]).unwrap();
        let result: CodecResult<Arrow> = CborCodec.unmarshal(&bytes);
        let err = result.unwrap_err();
        assert!(err.is_unmarshal());
        assert!(err.to_string().contains("Arrow"));
    }
}
