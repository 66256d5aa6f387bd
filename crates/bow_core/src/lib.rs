//! # bow core
//!
//! Typed buckets over a transactional single-file store.
//!
//! This crate provides:
//! - [`Database`]: one exclusively locked file holding named buckets
//! - [`Bucket`]: put, get, delete and ordered iteration of typed records
//! - [`Record`] and [`KeyEncode`]: how a record names its key and how keys
//!   turn into ordered bytes
//! - [`Iter`]: snapshot-isolated cursors
//! - Crash recovery, checksummed records and compaction
//!
//! Records are encoded with a pluggable [`Codec`] chosen when the database
//! is opened (CBOR by default).
//!
//! ## Example
//!
//! ```rust
//! use bow_core::{Database, Id};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Arrow {
//!     id: Id,
//!     length: u32,
//! }
//!
//! bow_core::impl_record!(Arrow, id: Id);
//!
//! let db = Database::open_in_memory()?;
//! let arrows = db.bucket("arrows");
//!
//! let id = Id::new();
//! arrows.put(&Arrow { id, length: 75 })?;
//! assert_eq!(arrows.get::<Arrow>(&id)?.length, 75);
//!
//! let mut iter = arrows.iter::<Arrow>()?;
//! let mut arrow = Arrow::default();
//! while iter.advance(&mut arrow) {
//!     println!("{} is {} cm", arrow.id, arrow.length);
//! }
//! iter.close();
//! # Ok::<(), bow_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod config;
mod database;
mod error;
mod iter;
mod key;
mod log;
mod stats;
mod store;
mod types;

pub use bucket::Bucket;
pub use config::Options;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use iter::{Iter, IterState};
pub use key::{record_key, Id, KeyBytes, KeyEncode, KeyError, KeyResult, KeySchema, Record};
pub use stats::{BucketStats, DatabaseStats};
pub use store::CompactionOutcome;
pub use types::{BucketId, SequenceNumber};

pub use bow_codec::{CborCodec, Codec, CodecError, Format, FormatCodec, JsonCodec};
