//! Snapshot iteration over a bucket.

use crate::bucket::Bucket;
use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use crate::key::KeyBytes;
use crate::store::ReadTxn;
use crate::types::BucketId;
use bow_codec::{CborCodec, Codec};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Bound;
use std::sync::Arc;

/// Lifecycle of an [`Iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    /// More records may follow.
    Open,
    /// The cursor passed the last key, or reading failed.
    Exhausted,
    /// [`Iter::close`] was called.
    Closed,
}

/// A forward cursor over one bucket at a fixed snapshot.
///
/// Records come in ascending key order. The snapshot is pinned from
/// creation until the iterator is exhausted, closed or dropped; writes
/// committed meanwhile are invisible to it, and compaction waits.
///
/// Two ways to drive it:
///
/// ```rust
/// # use bow_core::Database;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Default, Serialize, Deserialize)]
/// # struct Arrow { id: String, length: i64 }
/// # bow_core::impl_record!(Arrow, id: str);
/// # let db = Database::open_in_memory().unwrap();
/// # let arrows = db.bucket("arrows");
/// # arrows.put(&Arrow { id: "1".into(), length: 3 }).unwrap();
/// // cursor style: reuse one target, check err() afterwards
/// let mut iter = arrows.iter::<Arrow>().unwrap();
/// let mut arrow = Arrow::default();
/// while iter.advance(&mut arrow) {
///     assert_eq!(arrow.length, 3);
/// }
/// assert!(iter.err().is_none());
/// iter.close();
///
/// // as a std iterator of results
/// for arrow in arrows.iter::<Arrow>().unwrap() {
///     assert_eq!(arrow.unwrap().id, "1");
/// }
/// ```
///
/// When driven through [`Iterator`], a failure is yielded as the final
/// item instead of being kept for [`err`](Self::err).
pub struct Iter<T, C: Codec = CborCodec> {
    shared: Arc<Shared<C>>,
    bucket: String,
    bucket_id: Option<BucketId>,
    txn: Option<ReadTxn>,
    cursor: Bound<Vec<u8>>,
    state: IterState,
    err: Option<CoreError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned, C: Codec> Iter<T, C> {
    pub(crate) fn open(bucket: &Bucket<C>, start: Option<KeyBytes>) -> CoreResult<Self> {
        let txn = bucket.shared.store.begin_read()?;
        let bucket_id = txn.bucket(&bucket.name)?;
        let cursor = start.map_or(Bound::Unbounded, |key| Bound::Included(key.into_vec()));

        Ok(Self {
            shared: Arc::clone(&bucket.shared),
            bucket: bucket.name.clone(),
            bucket_id,
            txn: Some(txn),
            cursor,
            state: IterState::Open,
            err: None,
            _marker: PhantomData,
        })
    }

    /// Decodes the next record into `target` and moves past it.
    ///
    /// Returns false once the bucket is exhausted, after an error, or
    /// after [`close`](Self::close). On false `target` is untouched.
    pub fn advance(&mut self, target: &mut T) -> bool {
        match self.step() {
            Some(Ok(record)) => {
                *target = record;
                true
            }
            Some(Err(err)) => {
                self.err = Some(err);
                false
            }
            None => false,
        }
    }

    /// Returns the first error the iterator hit, if any.
    #[must_use]
    pub fn err(&self) -> Option<&CoreError> {
        self.err.as_ref()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> IterState {
        self.state
    }

    /// Returns the key of the record most recently produced.
    #[must_use]
    pub fn current_key(&self) -> Option<&[u8]> {
        match &self.cursor {
            Bound::Excluded(key) => Some(key.as_slice()),
            _ => None,
        }
    }

    /// Releases the snapshot. Safe to call more than once.
    pub fn close(&mut self) {
        self.txn = None;
        self.state = IterState::Closed;
    }

    fn finish(&mut self) {
        self.txn = None;
        self.state = IterState::Exhausted;
    }

    fn step(&mut self) -> Option<CoreResult<T>> {
        if self.state != IterState::Open {
            return None;
        }
        let Some(bucket_id) = self.bucket_id else {
            self.finish();
            return None;
        };

        let next = match &self.txn {
            Some(txn) => txn.next(bucket_id, self.cursor.as_ref().map(Vec::as_slice)),
            None => return None,
        };

        match next {
            Ok(Some((key, bytes))) => {
                let decoded = self.shared.codec.unmarshal(&bytes).map_err(|source| {
                    let key = KeyBytes::from_vec(key.clone()).ok();
                    CoreError::codec(&self.bucket, key.as_ref(), source)
                });
                self.cursor = Bound::Excluded(key);
                if decoded.is_err() {
                    self.finish();
                }
                Some(decoded)
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl<T: DeserializeOwned, C: Codec> Iterator for Iter<T, C> {
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

impl<T, C: Codec> fmt::Debug for Iter<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("bucket", &self.bucket)
            .field("state", &self.state)
            .field("snapshot", &self.txn.as_ref().map(ReadTxn::snapshot))
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Arrow {
        id: String,
        length: i64,
    }

    crate::impl_record!(Arrow, id: str);

    fn arrow(id: &str, length: i64) -> Arrow {
        Arrow {
            id: id.into(),
            length,
        }
    }

    #[test]
    fn advance_until_exhausted() {
        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        for id in ["b", "a", "c"] {
            arrows.put(&arrow(id, 1)).unwrap();
        }

        let mut iter = arrows.iter::<Arrow>().unwrap();
        let mut target = Arrow::default();
        let mut ids = Vec::new();
        while iter.advance(&mut target) {
            ids.push(target.id.clone());
            assert_eq!(iter.current_key(), Some(target.id.as_bytes()));
        }
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(iter.state(), IterState::Exhausted);
        assert!(iter.err().is_none());
        assert!(!iter.advance(&mut target));
    }

    #[test]
    fn missing_bucket_is_empty() {
        let db = Database::open_in_memory().unwrap();
        let mut iter = db.bucket("nothing").iter::<Arrow>().unwrap();
        let mut target = Arrow::default();
        assert!(!iter.advance(&mut target));
        assert!(iter.err().is_none());
        assert_eq!(iter.state(), IterState::Exhausted);
    }

    #[test]
    fn close_is_idempotent_and_stops_iteration() {
        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        arrows.put(&arrow("a", 1)).unwrap();

        let mut iter = arrows.iter::<Arrow>().unwrap();
        iter.close();
        iter.close();
        assert_eq!(iter.state(), IterState::Closed);
        let mut target = Arrow::default();
        assert!(!iter.advance(&mut target));
        assert!(iter.err().is_none());
        assert_eq!(db.stats().unwrap().pinned_snapshots, 0);
    }

    #[test]
    fn snapshot_pinned_until_exhausted() {
        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        arrows.put(&arrow("a", 1)).unwrap();

        let mut iter = arrows.iter::<Arrow>().unwrap();
        assert_eq!(db.stats().unwrap().pinned_snapshots, 1);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert_eq!(db.stats().unwrap().pinned_snapshots, 0);
    }

    #[test]
    fn decode_failure_is_sticky() {
        #[derive(Debug, Default, Deserialize)]
        struct Strict {
            #[allow(dead_code)]
            missing_field: u64,
        }

        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        arrows.put(&arrow("a", 1)).unwrap();
        arrows.put(&arrow("b", 2)).unwrap();

        let mut iter = arrows.iter::<Strict>().unwrap();
        let mut target = Strict::default();
        assert!(!iter.advance(&mut target));
        assert!(iter.err().unwrap().is_codec());
        assert!(!iter.advance(&mut target));
        assert!(iter.err().unwrap().is_codec());
        assert_eq!(iter.state(), IterState::Exhausted);
    }

    #[test]
    fn iter_from_starts_at_key() {
        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        for id in ["a", "b", "c", "d"] {
            arrows.put(&arrow(id, 1)).unwrap();
        }
        let ids: Vec<String> = arrows
            .iter_from::<Arrow, _>("b")
            .unwrap()
            .map(|a| a.unwrap().id)
            .collect();
        assert_eq!(ids, ["b", "c", "d"]);

        let ids: Vec<String> = arrows
            .iter_from::<Arrow, _>("bb")
            .unwrap()
            .map(|a| a.unwrap().id)
            .collect();
        assert_eq!(ids, ["c", "d"]);
    }

    #[test]
    fn closed_database_fails_cleanly() {
        let db = Database::open_in_memory().unwrap();
        let arrows = db.bucket("arrows");
        arrows.put(&arrow("a", 1)).unwrap();

        let mut iter = arrows.iter::<Arrow>().unwrap();
        db.close().unwrap();
        let mut target = Arrow::default();
        assert!(!iter.advance(&mut target));
        assert!(matches!(iter.err(), Some(CoreError::DatabaseClosed)));
    }
}
