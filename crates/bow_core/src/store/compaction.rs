//! Store file compaction.
//!
//! The log keeps every version ever committed. Compaction rewrites the
//! file with only the newest live value of each key:
//!
//! - Compaction **MUST NOT** change logical state
//! - Bucket creation order survives, empty buckets included
//! - The rewrite replaces the file atomically, so a crash leaves either
//!   the old or the new file

use super::index::{Slot, ValueRef, VersionIndex};
use super::Store;
use crate::error::{CoreError, CoreResult};
use crate::log::{FileHeader, LogRecord};
use tracing::{debug, info};

/// Result of [`Database::compact`](crate::Database::compact).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The file was rewritten.
    Compacted {
        /// File size before compaction.
        bytes_before: u64,
        /// File size after compaction.
        bytes_after: u64,
        /// Number of live records written.
        records: usize,
    },
    /// Readers still hold snapshots; nothing was done.
    Deferred {
        /// Number of pinned snapshots.
        pinned_snapshots: usize,
    },
}

impl CompactionOutcome {
    /// Returns true if the file was rewritten.
    #[must_use]
    pub fn is_compacted(&self) -> bool {
        matches!(self, Self::Compacted { .. })
    }
}

impl Store {
    /// Rewrites the store file keeping only live data.
    ///
    /// Waits for the active write transaction, then defers if any read
    /// snapshot is pinned.
    pub fn compact(&self) -> CoreResult<CompactionOutcome> {
        let _guard = self.write_lock.lock();
        self.ensure_open()?;

        let pinned_snapshots = self.snapshots.pinned();
        if pinned_snapshots > 0 {
            debug!(pinned_snapshots, "compaction deferred");
            return Ok(CompactionOutcome::Deferred { pinned_snapshots });
        }

        let committed = self.committed();
        let mut index = self.index.write();
        let directory = self.directory.read();
        let mut backend = self.backend.write();
        let backend = backend.as_mut().ok_or(CoreError::DatabaseClosed)?;
        let bytes_before = backend.size()?;

        let mut out = FileHeader::new(self.stored_format).encode().to_vec();
        for entry in directory.entries() {
            let record = LogRecord::CreateBucket {
                bucket: entry.id,
                name: entry.name.clone(),
            };
            out.extend_from_slice(&record.encode()?);
        }

        let mut fresh = VersionIndex::default();
        let mut records = 0;
        for (bucket, key, value) in index.live_entries() {
            let bytes = backend.read_at(value.offset, value.len as usize)?;
            let start = out.len() as u64;
            let record = LogRecord::Put {
                bucket,
                key: key.to_vec(),
                value: bytes,
            };
            out.extend_from_slice(&record.encode()?);
            let moved = ValueRef {
                offset: start + LogRecord::put_value_offset(key.len()) as u64,
                len: value.len,
            };
            fresh.insert(bucket, key.to_vec(), committed, Slot::Value(moved));
            records += 1;
        }
        out.extend_from_slice(&LogRecord::Commit { sequence: committed }.encode()?);

        backend.replace(&out)?;
        *index = fresh;

        let bytes_after = out.len() as u64;
        info!(bytes_before, bytes_after, records, "store file compacted");
        Ok(CompactionOutcome::Compacted {
            bytes_before,
            bytes_after,
            records,
        })
    }
}
