//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// Another process or handle holds the exclusive lock on the file.
    #[error("file is locked by another owner: {}", .path.display())]
    Locked {
        /// The contended file.
        path: PathBuf,
    },

    /// The file does not exist and creation was not requested.
    #[error("file does not exist: {}", .path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },
}
