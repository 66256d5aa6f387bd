//! JSON codec backed by `serde_json`.

use crate::error::{CodecError, CodecResult};
use crate::format::Format;
use crate::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Text codec storing each record as a compact JSON document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| CodecError::unsupported::<T>(Format::Json, e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            if e.is_eof() {
                CodecError::truncated::<T>(Format::Json)
            } else {
                CodecError::malformed::<T>(Format::Json, e.to_string())
            }
        })
    }
}
