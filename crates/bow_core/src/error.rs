//! Error types for bow core.

use crate::key::{KeyBytes, KeyError};
use bow_codec::CodecError;
use bow_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in bow operations.
///
/// Errors fall into four groups that callers can tell apart with
/// [`is_key`](Self::is_key), [`is_codec`](Self::is_codec),
/// [`is_not_found`](Self::is_not_found) and [`is_engine`](Self::is_engine).
/// Configuration and argument mistakes are reported separately.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The store file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    OpenFailed {
        /// Path of the store file.
        path: PathBuf,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// A key could not be derived from a record or argument.
    #[error("invalid key for {type_name} in bucket `{bucket}`: {source}")]
    Key {
        /// Bucket the operation targeted.
        bucket: String,
        /// Rust type the key came from.
        type_name: &'static str,
        /// What was wrong with the key.
        #[source]
        source: KeyError,
    },

    /// A record could not be marshalled or unmarshalled.
    #[error("codec error in bucket `{bucket}`{}: {source}", key_suffix(.key.as_ref()))]
    Codec {
        /// Bucket the operation targeted.
        bucket: String,
        /// Key of the record, when known.
        key: Option<KeyBytes>,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// No record is stored under the key.
    #[error("key {key} not found in bucket `{bucket}`")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// The key that was not found.
        key: KeyBytes,
    },

    /// The store file is corrupted or has an unknown layout.
    #[error("store corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the damaged record.
        offset: u64,
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// An option could not be parsed or is not known.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted with these arguments.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,
}

fn key_suffix(key: Option<&KeyBytes>) -> String {
    key.map(|key| format!(" for key {key}")).unwrap_or_default()
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a key error for a key of type `T`.
    pub fn key<T: ?Sized>(bucket: &str, source: KeyError) -> Self {
        Self::Key {
            bucket: bucket.to_string(),
            type_name: std::any::type_name::<T>(),
            source,
        }
    }

    /// Creates a codec error.
    pub fn codec(bucket: &str, key: Option<&KeyBytes>, source: CodecError) -> Self {
        Self::Codec {
            bucket: bucket.to_string(),
            key: key.cloned(),
            source,
        }
    }

    /// Creates a not found error.
    pub fn not_found(bucket: &str, key: &KeyBytes) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.clone(),
        }
    }

    /// Returns true if no record was stored under the requested key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if a key could not be derived.
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key { .. })
    }

    /// Returns true if the codec rejected a value or stored bytes.
    #[must_use]
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec { .. })
    }

    /// Returns true for failures of the underlying engine: I/O, lock
    /// contention, corruption and use after close.
    #[must_use]
    pub fn is_engine(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::OpenFailed { .. }
                | Self::Corruption { .. }
                | Self::ChecksumMismatch { .. }
                | Self::DatabaseClosed
        )
    }

    /// Returns the codec failure, if this is a codec error.
    #[must_use]
    pub fn codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Codec { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bow_codec::Format;

    #[test]
    fn categories() {
        let key = KeyBytes::encode("123").unwrap();
        assert!(CoreError::not_found("arrows", &key).is_not_found());
        assert!(CoreError::key::<str>("arrows", KeyError::EmptyKey).is_key());
        assert!(CoreError::DatabaseClosed.is_engine());
        assert!(CoreError::corruption("bad magic").is_engine());
        assert!(!CoreError::config("x").is_engine());

        let codec = CoreError::codec(
            "arrows",
            Some(&key),
            CodecError::truncated::<u32>(Format::Cbor),
        );
        assert!(codec.is_codec());
        assert!(!codec.is_engine());
        assert!(codec.codec_error().unwrap().is_unmarshal());
    }

    #[test]
    fn messages_carry_context() {
        let key = KeyBytes::encode("123").unwrap();
        let err = CoreError::not_found("arrows", &key);
        assert_eq!(err.to_string(), "key \"123\" not found in bucket `arrows`");

        let err = CoreError::codec("arrows", None, CodecError::truncated::<u32>(Format::Json));
        assert!(err.to_string().starts_with("codec error in bucket `arrows`: "));

        let err = CoreError::key::<str>("arrows", KeyError::EmptyKey);
        assert_eq!(err.to_string(), "invalid key for str in bucket `arrows`: key is empty");
    }
}
