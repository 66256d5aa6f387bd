//! On-disk log format.
//!
//! A store file is a [`FileHeader`] followed by a sequence of records:
//!
//! ```text
//! | magic (4) | version (2) | type (1) | length (4) | header crc32 (4) | payload (N) | crc32 (4) |
//! ```
//!
//! The header CRC covers the fields before it; the trailing CRC covers the
//! whole header and payload. A write transaction is
//! its `CreateBucket`, `Put` and `Delete` records followed by one `Commit`.
//! Records after the last `Commit` belong to a transaction that never
//! finished and are discarded by recovery.

mod header;
mod reader;
mod record;

pub(crate) use header::FileHeader;
pub(crate) use reader::{LogEntry, LogReader};
pub(crate) use record::LogRecord;
