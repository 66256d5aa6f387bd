//! Key extraction for schemaless documents.

use super::{KeyBytes, KeyError, KeyResult};
use serde_json::Value;

/// Names the key field of untyped JSON documents.
///
/// Typed records carry their key through [`Record`](crate::Record). For
/// documents without a Rust type, such as the ones the command line tool
/// stores, a `KeySchema` picks the field by name at runtime.
///
/// Strings use their raw bytes and integers use the fixed-width `i64`
/// encoding. Other value types have no key encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    field: String,
}

impl KeySchema {
    /// Creates a schema keyed on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Returns the key field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Extracts and encodes the key of `doc`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::NoKeyField`] if `doc` is not an object or lacks the field
    /// - [`KeyError::UnsupportedKeyType`] for floats, booleans, nulls, arrays,
    ///   objects and integers above `i64::MAX`
    /// - [`KeyError::EmptyKey`] for an empty string
    pub fn extract(&self, doc: &Value) -> KeyResult<KeyBytes> {
        let value = doc
            .as_object()
            .and_then(|object| object.get(&self.field))
            .ok_or_else(|| KeyError::NoKeyField {
                field: self.field.clone(),
            })?;

        match value {
            Value::String(text) => KeyBytes::encode(text.as_str()),
            Value::Number(number) => match number.as_i64() {
                Some(int) => KeyBytes::encode(&int),
                None if number.is_u64() => Err(self.unsupported("integer out of i64 range")),
                None => Err(self.unsupported("float")),
            },
            Value::Bool(_) => Err(self.unsupported("bool")),
            Value::Null => Err(self.unsupported("null")),
            Value::Array(_) => Err(self.unsupported("array")),
            Value::Object(_) => Err(self.unsupported("object")),
        }
    }

    /// Encodes a key given on a command line or in a config file.
    ///
    /// Text that parses as an `i64` is encoded as an integer, anything else
    /// as a string.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::EmptyKey`] for empty text.
    pub fn parse_key(text: &str) -> KeyResult<KeyBytes> {
        match text.parse::<i64>() {
            Ok(int) => KeyBytes::encode(&int),
            Err(_) => KeyBytes::encode(text),
        }
    }

    fn unsupported(&self, found: &str) -> KeyError {
        KeyError::UnsupportedKeyType {
            field: self.field.clone(),
            found: found.to_string(),
        }
    }
}
