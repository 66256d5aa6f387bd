//! The transactional store engine.
//!
//! One file holds everything: a header and an append-only log of
//! committed transactions. On open the log is replayed into a
//! [`VersionIndex`] that keeps, per key, every version some reader may
//! still need.
//!
//! # Concurrency
//!
//! - One writer at a time, serialized by `write_lock`
//! - Any number of readers, each pinned to the committed sequence it
//!   started at
//! - Lock order is `index`, then `directory`, then `backend`

mod compaction;
mod directory;
mod index;
mod recovery;
mod snapshot;
mod txn;

pub use compaction::CompactionOutcome;
pub(crate) use txn::{ReadTxn, WriteTxn};

use crate::error::{CoreError, CoreResult};
use crate::log::{FileHeader, LogRecord};
use crate::stats::{BucketStats, DatabaseStats};
use crate::types::{BucketId, SequenceNumber};
use bow_codec::Format;
use bow_storage::StorageBackend;
use directory::BucketDirectory;
use index::{Slot, ValueRef, VersionIndex};
use parking_lot::{Mutex, RwLock};
use snapshot::SnapshotRegistry;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub(crate) struct Store {
    backend: RwLock<Option<Box<dyn StorageBackend>>>,
    index: RwLock<VersionIndex>,
    directory: RwLock<BucketDirectory>,
    snapshots: SnapshotRegistry,
    write_lock: Mutex<()>,
    closed: AtomicBool,
    stored_format: Format,
    sync_on_commit: bool,
}

impl Store {
    /// Opens a store over `backend`, writing a fresh header if it is empty
    /// and replaying the log otherwise.
    pub fn open(
        mut backend: Box<dyn StorageBackend>,
        format: Format,
        sync_on_commit: bool,
    ) -> CoreResult<Arc<Self>> {
        let stored_format = prepare_header(backend.as_mut(), format)?;
        let recovered = recovery::recover(backend.as_mut())?;

        Ok(Arc::new(Self {
            backend: RwLock::new(Some(backend)),
            index: RwLock::new(recovered.index),
            directory: RwLock::new(recovered.directory),
            snapshots: SnapshotRegistry::new(recovered.committed),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            stored_format,
            sync_on_commit,
        }))
    }

    /// Codec format recorded in the file header.
    pub fn stored_format(&self) -> Format {
        self.stored_format
    }

    /// Last committed sequence.
    pub fn committed(&self) -> SequenceNumber {
        self.snapshots.committed()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_closed() {
            Err(CoreError::DatabaseClosed)
        } else {
            Ok(())
        }
    }

    /// Starts a read transaction at the current committed sequence.
    pub fn begin_read(self: &Arc<Self>) -> CoreResult<ReadTxn> {
        self.ensure_open()?;
        let snapshot = self.snapshots.pin();
        trace!(snapshot = snapshot.as_u64(), "read transaction started");
        Ok(ReadTxn::new(Arc::clone(self), snapshot))
    }

    /// Starts the write transaction, waiting for any active one to finish.
    pub fn begin_write(&self) -> CoreResult<WriteTxn<'_>> {
        let guard = self.write_lock.lock();
        self.ensure_open()?;
        Ok(WriteTxn::new(self, guard))
    }

    fn read_value(&self, value: ValueRef) -> CoreResult<Vec<u8>> {
        let backend = self.backend.read();
        let backend = backend.as_ref().ok_or(CoreError::DatabaseClosed)?;
        Ok(backend.read_at(value.offset, value.len as usize)?)
    }

    fn get_at(&self, bucket: BucketId, key: &[u8], snapshot: SequenceNumber) -> CoreResult<Option<Vec<u8>>> {
        let index = self.index.read();
        index
            .visible(bucket, key, snapshot)
            .map(|value| self.read_value(value))
            .transpose()
    }

    fn get_latest(&self, bucket: BucketId, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.get_at(bucket, key, self.committed())
    }

    fn next_at(
        &self,
        bucket: BucketId,
        from: Bound<&[u8]>,
        snapshot: SequenceNumber,
    ) -> CoreResult<Option<(Vec<u8>, Vec<u8>)>> {
        let index = self.index.read();
        match index.next_visible(bucket, from, snapshot) {
            Some((key, value)) => Ok(Some((key, self.read_value(value)?))),
            None => Ok(None),
        }
    }

    /// Appends a transaction to the log and publishes it.
    ///
    /// Called by [`WriteTxn::commit`] with the writer lock held.
    fn commit(
        &self,
        created: Vec<(BucketId, String)>,
        writes: BTreeMap<(BucketId, Vec<u8>), Option<Vec<u8>>>,
    ) -> CoreResult<SequenceNumber> {
        self.ensure_open()?;
        if created.is_empty() && writes.is_empty() {
            return Ok(self.committed());
        }

        let seq = self.committed().next();
        let mut batch = Vec::new();
        for (bucket, name) in &created {
            let record = LogRecord::CreateBucket {
                bucket: *bucket,
                name: name.clone(),
            };
            batch.extend_from_slice(&record.encode()?);
        }

        // (bucket, key, slot with offset relative to the batch start)
        let mut placed = Vec::with_capacity(writes.len());
        for ((bucket, key), value) in writes {
            let start = batch.len() as u64;
            match value {
                Some(value) => {
                    let len = value.len();
                    let record = LogRecord::Put {
                        bucket,
                        key: key.clone(),
                        value,
                    };
                    batch.extend_from_slice(&record.encode()?);
                    let relative = ValueRef {
                        offset: start + LogRecord::put_value_offset(key.len()) as u64,
                        len: len as u32,
                    };
                    placed.push((bucket, key, Slot::Value(relative)));
                }
                None => {
                    let record = LogRecord::Delete {
                        bucket,
                        key: key.clone(),
                    };
                    batch.extend_from_slice(&record.encode()?);
                    placed.push((bucket, key, Slot::Tombstone));
                }
            }
        }
        batch.extend_from_slice(&LogRecord::Commit { sequence: seq }.encode()?);

        let base = self.append_batch(&batch)?;

        {
            let mut index = self.index.write();
            for (bucket, key, slot) in placed {
                let slot = match slot {
                    Slot::Value(value) => Slot::Value(ValueRef {
                        offset: base + value.offset,
                        len: value.len,
                    }),
                    Slot::Tombstone => Slot::Tombstone,
                };
                index.insert(bucket, key, seq, slot);
            }

            let mut directory = self.directory.write();
            for (bucket, name) in created {
                debug!(%bucket, name = %name, "bucket created");
                directory.register(bucket, name, seq)?;
            }
        }

        let horizon = self.snapshots.publish(seq);
        let pruned = self.index.write().prune(horizon);
        trace!(
            sequence = seq.as_u64(),
            bytes = batch.len(),
            pruned,
            "transaction committed"
        );
        Ok(seq)
    }

    fn append_batch(&self, batch: &[u8]) -> CoreResult<u64> {
        let mut backend = self.backend.write();
        let backend = backend.as_mut().ok_or(CoreError::DatabaseClosed)?;
        let base = backend.size()?;

        let written = backend.append(batch).and_then(|offset| {
            backend.flush()?;
            if self.sync_on_commit {
                backend.sync()?;
            }
            Ok(offset)
        });

        written.map_err(|err| {
            // cut off whatever part of the batch reached the file
            if let Err(cleanup) = backend.truncate(base) {
                warn!(error = %cleanup, "failed to discard partial commit");
            }
            CoreError::from(err)
        })
    }

    /// Flushes and releases the backend. Later calls are no-ops.
    ///
    /// Waits for an active write transaction to finish.
    pub fn close(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let backend = self.backend.write().take();
        if let Some(mut backend) = backend {
            backend.flush()?;
            backend.sync()?;
        }
        Ok(())
    }

    /// Collects statistics at the current committed sequence.
    pub fn stats(self: &Arc<Self>) -> CoreResult<DatabaseStats> {
        let txn = self.begin_read()?;
        let snapshot = txn.snapshot();

        let entries: Vec<(BucketId, String)> = {
            let directory = self.directory.read();
            directory
                .entries()
                .filter(|entry| entry.created <= snapshot)
                .map(|entry| (entry.id, entry.name.clone()))
                .collect()
        };
        let (buckets, versions) = {
            let index = self.index.read();
            let buckets = entries
                .into_iter()
                .map(|(id, name)| BucketStats {
                    name,
                    records: index.count_visible(id, snapshot),
                })
                .collect();
            (buckets, index.version_count())
        };

        let file_size = {
            let backend = self.backend.read();
            backend
                .as_ref()
                .ok_or(CoreError::DatabaseClosed)?
                .size()?
        };

        Ok(DatabaseStats {
            sequence: snapshot.as_u64(),
            file_size,
            format: self.stored_format,
            buckets,
            versions,
            // excludes the snapshot pinned by this call
            pinned_snapshots: self.snapshots.pinned().saturating_sub(1),
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("committed", &self.committed())
            .field("stored_format", &self.stored_format)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Writes a header to an empty file or validates an existing one.
///
/// Returns the format recorded in the header.
fn prepare_header(backend: &mut dyn StorageBackend, format: Format) -> CoreResult<Format> {
    let size = backend.size()?;
    let header_size = FileHeader::SIZE as u64;

    if size < header_size {
        if size > 0 {
            let existing = backend.read_at(0, size as usize)?;
            if !FileHeader::is_partial(&existing) {
                return Err(CoreError::corruption(format!(
                    "not a store file: {size} bytes without a store header"
                )));
            }
            warn!(size, "store file ends inside its header, reinitializing");
            backend.truncate(0)?;
        }
        backend.append(&FileHeader::new(format).encode())?;
        backend.flush()?;
        backend.sync()?;
        return Ok(format);
    }

    let header = FileHeader::decode(&backend.read_at(0, FileHeader::SIZE)?)?;
    if header.format != format {
        warn!(
            stored = %header.format,
            requested = %format,
            "store file was created with a different codec"
        );
    }
    Ok(header.format)
}
