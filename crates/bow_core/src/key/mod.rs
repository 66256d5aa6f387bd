//! Key extraction and encoding.
//!
//! Every record type stored in a bucket designates exactly one key field
//! through the [`Record`] trait. The key value is turned into bytes by
//! [`KeyEncode`]. Keys are compared bytewise, so encodings are chosen to
//! keep byte order equal to value order within one key type.
//!
//! | Key type | Encoding |
//! |----------|----------|
//! | `str`, `String` | raw UTF-8 bytes |
//! | `[u8]`, `Vec<u8>`, `[u8; N]` | bytes as-is |
//! | `u8`..`u128` | big-endian at the type's own width |
//! | `i8`..`i128` | big-endian at the type's own width, sign bit flipped |
//! | [`Id`] | its 16 raw bytes |

mod encode;
mod id;
mod schema;

pub use encode::{KeyBytes, KeyEncode};
pub use id::Id;
pub use schema::KeySchema;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for key extraction.
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors raised while deriving a key from a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The record has no field marked as its key.
    #[error("record has no key field `{field}`")]
    NoKeyField {
        /// Name of the expected key field.
        field: String,
    },

    /// The key field holds a type that has no key encoding.
    #[error("key field `{field}` has unsupported type {found}")]
    UnsupportedKeyType {
        /// Name of the key field.
        field: String,
        /// Description of the type that was found.
        found: String,
    },

    /// The key encodes to zero bytes.
    #[error("key is empty")]
    EmptyKey,
}

/// A record type that can be stored in a bucket.
///
/// The key is whatever [`Record::key`] returns, so a record type has
/// exactly one key field by construction. Use [`impl_record!`](crate::impl_record)
/// for the common case of a plain field.
///
/// ```rust
/// use bow_core::Record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Arrow {
///     id: String,
///     length: i64,
/// }
///
/// impl Record for Arrow {
///     type Key = str;
///
///     fn key(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Type of the key field.
    type Key: KeyEncode + ?Sized;

    /// Returns the key field.
    fn key(&self) -> &Self::Key;
}

/// Implements [`Record`] for a struct whose key is one of its fields.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Quiver {
///     id: i64,
///     arrows: Vec<String>,
/// }
///
/// bow_core::impl_record!(Quiver, id: i64);
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty, $field:ident : $key:ty) => {
        impl $crate::Record for $ty {
            type Key = $key;

            fn key(&self) -> &$key {
                &self.$field
            }
        }
    };
}

/// Encodes the key of a record.
///
/// # Errors
///
/// Returns [`KeyError::EmptyKey`] when the key has no bytes.
pub fn record_key<T: Record>(record: &T) -> KeyResult<KeyBytes> {
    KeyBytes::encode(record.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Arrow {
        id: String,
        length: i64,
    }

    crate::impl_record!(Arrow, id: str);

    #[derive(Serialize, Deserialize)]
    struct Quiver {
        id: i64,
    }

    crate::impl_record!(Quiver, id: i64);

    #[test]
    fn string_key_is_raw_bytes() {
        let arrow = Arrow {
            id: "123".into(),
            length: 7,
        };
        assert_eq!(record_key(&arrow).unwrap().as_bytes(), b"123");
    }

    #[test]
    fn empty_string_key_is_rejected() {
        let arrow = Arrow {
            id: String::new(),
            length: 7,
        };
        assert_eq!(record_key(&arrow), Err(KeyError::EmptyKey));
    }

    #[test]
    fn integer_key_is_fixed_width() {
        let quiver = Quiver { id: -1 };
        assert_eq!(
            record_key(&quiver).unwrap().as_bytes(),
            &[0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }
}
