//! # bow storage
//!
//! Storage backend trait and implementations for bow.
//!
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store. The store engine in `bow_core` owns the file
//! format; a backend only reads, appends, flushes and atomically replaces
//! bytes.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - A single exclusively locked file on disk
//!
//! ## Example
//!
//! ```rust
//! use bow_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, FileOptions, DEFAULT_FILE_MODE};
pub use memory::InMemoryBackend;
