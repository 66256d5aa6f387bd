//! Multi-version key index.
//!
//! Every key maps to a chain of versions in commit order. A reader at
//! snapshot `S` sees the newest version whose sequence is at most `S`.
//! Values stay in the store file; the index only records where.

use crate::types::{BucketId, SequenceNumber};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

/// Location of a value in the store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueRef {
    /// Offset of the value bytes.
    pub offset: u64,
    /// Length of the value bytes.
    pub len: u32,
}

/// What a version holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// A stored value.
    Value(ValueRef),
    /// The key was deleted.
    Tombstone,
}

#[derive(Debug, Clone, Copy)]
struct Version {
    seq: SequenceNumber,
    slot: Slot,
}

type Chains = BTreeMap<Vec<u8>, Vec<Version>>;

fn visible_in(chain: &[Version], snapshot: SequenceNumber) -> Option<ValueRef> {
    match chain.iter().rev().find(|v| v.seq <= snapshot)?.slot {
        Slot::Value(value) => Some(value),
        Slot::Tombstone => None,
    }
}

/// Ordered, versioned index of every bucket.
#[derive(Debug, Default)]
pub(crate) struct VersionIndex {
    buckets: BTreeMap<BucketId, Chains>,
    /// Keys whose chain may hold versions that pruning can drop.
    stale: HashSet<(BucketId, Vec<u8>)>,
}

impl VersionIndex {
    /// Adds a version of `key` committed at `seq`.
    pub fn insert(&mut self, bucket: BucketId, key: Vec<u8>, seq: SequenceNumber, slot: Slot) {
        let chain = self
            .buckets
            .entry(bucket)
            .or_default()
            .entry(key.clone())
            .or_default();

        match chain.last_mut() {
            Some(last) if last.seq == seq => last.slot = slot,
            _ => chain.push(Version { seq, slot }),
        }

        if chain.len() > 1 || slot == Slot::Tombstone {
            self.stale.insert((bucket, key));
        }
    }

    /// Returns the value of `key` visible at `snapshot`.
    pub fn visible(&self, bucket: BucketId, key: &[u8], snapshot: SequenceNumber) -> Option<ValueRef> {
        visible_in(self.buckets.get(&bucket)?.get(key)?, snapshot)
    }

    /// Returns the first key at or after `from` that has a value visible
    /// at `snapshot`.
    pub fn next_visible(
        &self,
        bucket: BucketId,
        from: Bound<&[u8]>,
        snapshot: SequenceNumber,
    ) -> Option<(Vec<u8>, ValueRef)> {
        self.buckets
            .get(&bucket)?
            .range::<[u8], _>((from, Bound::Unbounded))
            .find_map(|(key, chain)| visible_in(chain, snapshot).map(|value| (key.clone(), value)))
    }

    /// Counts the keys with a value visible at `snapshot`.
    pub fn count_visible(&self, bucket: BucketId, snapshot: SequenceNumber) -> usize {
        self.buckets.get(&bucket).map_or(0, |chains| {
            chains
                .values()
                .filter(|chain| visible_in(chain, snapshot).is_some())
                .count()
        })
    }

    /// Iterates the newest live value of every key, bucket by bucket in
    /// ID order and key order within a bucket.
    pub fn live_entries(&self) -> impl Iterator<Item = (BucketId, &[u8], ValueRef)> + '_ {
        self.buckets.iter().flat_map(|(bucket, chains)| {
            chains.iter().filter_map(move |(key, chain)| match chain.last()?.slot {
                Slot::Value(value) => Some((*bucket, key.as_slice(), value)),
                Slot::Tombstone => None,
            })
        })
    }

    /// Total number of versions held.
    pub fn version_count(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|chains| chains.values())
            .map(Vec::len)
            .sum()
    }

    /// Drops versions no snapshot at or after `horizon` can see.
    ///
    /// Returns the number of versions dropped.
    pub fn prune(&mut self, horizon: SequenceNumber) -> usize {
        let mut dropped = 0;

        for (bucket, key) in std::mem::take(&mut self.stale) {
            let Some(chains) = self.buckets.get_mut(&bucket) else {
                continue;
            };
            let Some(chain) = chains.get_mut(&key) else {
                continue;
            };

            // versions older than the newest one at or below the horizon
            // are shadowed for every remaining reader
            if let Some(keep_from) = chain.iter().rposition(|v| v.seq <= horizon) {
                chain.drain(..keep_from);
                dropped += keep_from;
            }

            let head = chain[0];
            if chain.len() == 1 && head.slot == Slot::Tombstone && head.seq <= horizon {
                chains.remove(&key);
                dropped += 1;
            } else if chain.len() > 1 || head.slot == Slot::Tombstone {
                self.stale.insert((bucket, key));
            }
        }

        dropped
    }
}
