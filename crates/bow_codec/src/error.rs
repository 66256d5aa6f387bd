//! Error types for the codec crate.

use crate::format::Format;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during marshalling or unmarshalling.
///
/// Marshal failures are caller-side programming mistakes (the value's
/// type cannot be represented by the codec); unmarshal failures mean the
/// stored bytes do not describe the requested type in this format. Neither
/// is ever an I/O fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value's type cannot be represented by the codec.
    #[error("{format} codec cannot marshal {type_name}: {message}")]
    Unsupported {
        /// Format of the rejecting codec.
        format: Format,
        /// Rust type that was being marshalled.
        type_name: &'static str,
        /// Reason reported by the serializer.
        message: String,
    },

    /// The bytes are not a valid encoding of the target type.
    #[error("malformed {format} data for {type_name}: {message}")]
    Malformed {
        /// Format of the decoding codec.
        format: Format,
        /// Rust type that was being unmarshalled.
        type_name: &'static str,
        /// Reason reported by the deserializer.
        message: String,
    },

    /// The bytes end before a complete value was read.
    #[error("truncated {format} data for {type_name}")]
    Truncated {
        /// Format of the decoding codec.
        format: Format,
        /// Rust type that was being unmarshalled.
        type_name: &'static str,
    },

    /// An unknown format tag or name was requested.
    #[error("unknown codec format: {0}")]
    UnknownFormat(String),
}

impl CodecError {
    /// Creates an unsupported-type error for `T`.
    pub fn unsupported<T: ?Sized>(format: Format, message: impl Into<String>) -> Self {
        Self::Unsupported {
            format,
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }

    /// Creates a malformed-data error for `T`.
    pub fn malformed<T: ?Sized>(format: Format, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }

    /// Creates a truncated-data error for `T`.
    pub fn truncated<T: ?Sized>(format: Format) -> Self {
        Self::Truncated {
            format,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns true if this error came from marshalling.
    #[must_use]
    pub fn is_marshal(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns true if this error came from unmarshalling.
    #[must_use]
    pub fn is_unmarshal(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Truncated { .. })
    }
}
