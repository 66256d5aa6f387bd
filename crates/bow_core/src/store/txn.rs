//! Read and write transactions.

use super::Store;
use crate::error::CoreResult;
use crate::types::{BucketId, SequenceNumber};
use parking_lot::MutexGuard;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// A read-only view of the store at one committed sequence.
///
/// The snapshot stays pinned until the transaction is released or
/// dropped. Later commits are invisible to it.
#[derive(Debug)]
pub(crate) struct ReadTxn {
    store: Arc<Store>,
    snapshot: SequenceNumber,
    active: bool,
}

impl ReadTxn {
    pub(super) fn new(store: Arc<Store>, snapshot: SequenceNumber) -> Self {
        Self {
            store,
            snapshot,
            active: true,
        }
    }

    /// Returns the pinned snapshot.
    pub fn snapshot(&self) -> SequenceNumber {
        self.snapshot
    }

    /// Looks up a bucket that exists at this snapshot.
    pub fn bucket(&self, name: &str) -> CoreResult<Option<BucketId>> {
        self.store.ensure_open()?;
        Ok(self.store.directory.read().lookup_at(name, self.snapshot))
    }

    /// Reads the value of `key`.
    pub fn get(&self, bucket: BucketId, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.store.ensure_open()?;
        self.store.get_at(bucket, key, self.snapshot)
    }

    /// Reads the first key at or after `from` and its value.
    pub fn next(&self, bucket: BucketId, from: Bound<&[u8]>) -> CoreResult<Option<(Vec<u8>, Vec<u8>)>> {
        self.store.ensure_open()?;
        self.store.next_at(bucket, from, self.snapshot)
    }

    /// Counts the keys in a bucket.
    pub fn count(&self, bucket: BucketId) -> CoreResult<usize> {
        self.store.ensure_open()?;
        Ok(self.store.index.read().count_visible(bucket, self.snapshot))
    }

    /// Lists bucket names in creation order.
    pub fn buckets(&self) -> CoreResult<Vec<String>> {
        self.store.ensure_open()?;
        Ok(self.store.directory.read().names_at(self.snapshot))
    }

    /// Unpins the snapshot. Safe to call more than once.
    pub fn release(&mut self) {
        if self.active {
            self.active = false;
            self.store.snapshots.unpin(self.snapshot);
        }
    }
}

impl Drop for ReadTxn {
    fn drop(&mut self) {
        self.release();
    }
}

/// The single active write transaction.
///
/// Holds the store's writer lock for its whole lifetime. Writes are
/// buffered and reach the file only on [`commit`](Self::commit); dropping
/// the transaction discards them.
pub(crate) struct WriteTxn<'a> {
    store: &'a Store,
    _guard: MutexGuard<'a, ()>,
    created: Vec<(BucketId, String)>,
    writes: BTreeMap<(BucketId, Vec<u8>), Option<Vec<u8>>>,
    next_bucket: BucketId,
}

impl<'a> WriteTxn<'a> {
    pub(super) fn new(store: &'a Store, guard: MutexGuard<'a, ()>) -> Self {
        let next_bucket = store.directory.read().next_id();
        Self {
            store,
            _guard: guard,
            created: Vec::new(),
            writes: BTreeMap::new(),
            next_bucket,
        }
    }

    /// Looks up a bucket, including ones created by this transaction.
    pub fn bucket(&self, name: &str) -> Option<BucketId> {
        self.store.directory.read().lookup(name).or_else(|| {
            self.created
                .iter()
                .find(|(_, created)| created == name)
                .map(|(id, _)| *id)
        })
    }

    /// Looks up a bucket and creates it if it does not exist yet.
    pub fn bucket_or_create(&mut self, name: &str) -> BucketId {
        if let Some(id) = self.bucket(name) {
            return id;
        }
        let id = self.next_bucket;
        self.next_bucket = BucketId::new(id.as_u32() + 1);
        self.created.push((id, name.to_string()));
        id
    }

    /// Reads `key` as this transaction would leave it.
    pub fn get(&self, bucket: BucketId, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(&(bucket, key.to_vec())) {
            return Ok(pending.clone());
        }
        self.store.get_latest(bucket, key)
    }

    /// Stores `value` under `key`.
    pub fn put(&mut self, bucket: BucketId, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert((bucket, key), Some(value));
    }

    /// Removes `key`.
    pub fn delete(&mut self, bucket: BucketId, key: Vec<u8>) {
        self.writes.insert((bucket, key), None);
    }

    /// Makes every buffered write durable and visible.
    ///
    /// Returns the sequence number of the commit.
    pub fn commit(self) -> CoreResult<SequenceNumber> {
        let WriteTxn {
            store,
            _guard,
            created,
            writes,
            ..
        } = self;
        store.commit(created, writes)
    }
}
