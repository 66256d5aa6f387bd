//! Model-checking harness.
//!
//! Applies operations to a real bucket and to an in-memory model side by
//! side, then checks that they agree.

use crate::generators::ArrowOp;
use crate::models::Arrow;
use bow_core::{Bucket, Codec, CoreResult};
use std::collections::BTreeMap;

/// Mirrors an arrow bucket in a `BTreeMap`.
pub struct ModelHarness<C: Codec> {
    bucket: Bucket<C>,
    expected: BTreeMap<String, Arrow>,
}

impl<C: Codec> ModelHarness<C> {
    /// Creates a harness for an empty bucket.
    pub fn new(bucket: Bucket<C>) -> Self {
        Self {
            bucket,
            expected: BTreeMap::new(),
        }
    }

    /// Returns the expected contents.
    pub fn expected(&self) -> &BTreeMap<String, Arrow> {
        &self.expected
    }

    /// Points the harness at another handle for the same bucket, e.g.
    /// after reopening the database.
    pub fn rebind(&mut self, bucket: Bucket<C>) {
        self.bucket = bucket;
    }

    /// Applies one operation to both sides.
    ///
    /// Deleting a missing key must fail with not found on the real side.
    pub fn apply(&mut self, op: &ArrowOp) -> CoreResult<()> {
        match op {
            ArrowOp::Put(arrow) => {
                self.bucket.put(arrow)?;
                self.expected.insert(arrow.id.clone(), arrow.clone());
            }
            ArrowOp::Delete(id) => {
                let result = self.bucket.delete(id.as_str());
                match self.expected.remove(id) {
                    Some(_) => result?,
                    None => assert!(
                        result.as_ref().is_err_and(|err| err.is_not_found()),
                        "deleting missing {id} returned {result:?}"
                    ),
                }
            }
        }
        Ok(())
    }

    /// Checks point reads, the record count and full iteration order.
    pub fn verify(&self) -> CoreResult<()> {
        assert_eq!(self.bucket.len()?, self.expected.len());

        for (id, arrow) in &self.expected {
            assert_eq!(&self.bucket.get::<Arrow>(id.as_str())?, arrow);
        }

        let stored = self.bucket.iter::<Arrow>()?.collect::<CoreResult<Vec<_>>>()?;
        let expected: Vec<_> = self.expected.values().cloned().collect();
        assert_eq!(stored, expected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestDb;
    use crate::generators::arrow_ops_strategy;
    use crate::models::sample_arrows;
    use bow_core::{CompactionOutcome, Database, IterState, Options};
    use proptest::prelude::*;
    use proptest::test_runner::Config;

    proptest! {
        #![proptest_config(Config::with_cases(32))]

        #[test]
        fn matches_model_in_memory(ops in arrow_ops_strategy(64)) {
            let db = Database::open_in_memory().unwrap();
            let mut harness = ModelHarness::new(db.bucket("arrows"));
            for op in &ops {
                harness.apply(op).unwrap();
            }
            harness.verify().unwrap();
        }

        #[test]
        fn matches_model_after_reopen_and_compaction(ops in arrow_ops_strategy(48)) {
            let mut db = TestDb::with_options(Options::new().sync_on_commit(false));
            let mut harness = ModelHarness::new(db.bucket("arrows"));
            for op in &ops {
                harness.apply(op).unwrap();
            }

            db.reopen();
            harness.rebind(db.bucket("arrows"));
            harness.verify().unwrap();

            prop_assert!(db.compact().unwrap().is_compacted());
            harness.verify().unwrap();

            db.reopen();
            harness.rebind(db.bucket("arrows"));
            harness.verify().unwrap();
        }
    }

    #[test]
    fn iterator_sees_snapshot_while_get_sees_update() {
        let db = TestDb::new();
        let arrows = db.bucket("arrows");
        arrows.put(&Arrow::new("123", 1)).unwrap();
        arrows.put(&Arrow::new("456", 2)).unwrap();

        let mut iter = arrows.iter::<Arrow>().unwrap();
        let writer = {
            let arrows = arrows.clone();
            std::thread::spawn(move || arrows.put(&Arrow::new("789", 3)))
        };
        writer.join().unwrap().unwrap();

        let mut seen = Vec::new();
        let mut arrow = Arrow::default();
        while iter.advance(&mut arrow) {
            seen.push(arrow.id.clone());
        }
        assert!(iter.err().is_none());
        assert_eq!(seen, ["123", "456"]);

        assert_eq!(arrows.get::<Arrow>("789").unwrap().length, 3);
        assert_eq!(arrows.len().unwrap(), 3);
    }

    #[test]
    fn update_during_iteration_is_invisible_to_iterator() {
        let db = TestDb::new();
        let arrows = db.bucket("arrows");
        arrows.put(&Arrow::new("123", 10)).unwrap();
        arrows.put(&Arrow::new("456", 20)).unwrap();

        let mut iter = arrows.iter::<Arrow>().unwrap();
        let mut arrow = Arrow::default();
        assert!(iter.advance(&mut arrow));
        assert_eq!(arrow, Arrow::new("123", 10));

        let writer = {
            let arrows = arrows.clone();
            std::thread::spawn(move || arrows.put(&Arrow::new("123", 99)))
        };
        writer.join().unwrap().unwrap();

        assert!(iter.advance(&mut arrow));
        assert_eq!(arrow, Arrow::new("456", 20));
        assert!(!iter.advance(&mut arrow));
        assert!(iter.err().is_none());

        assert_eq!(arrows.get::<Arrow>("123").unwrap().length, 99);
    }

    #[test]
    fn buckets_persist_in_creation_order() {
        let mut db = TestDb::new();
        db.bucket("arrows").put(&Arrow::new("a", 1)).unwrap();
        db.bucket("new_arrows").put(&Arrow::new("b", 2)).unwrap();

        db.reopen();
        assert_eq!(db.buckets().unwrap(), ["arrows", "new_arrows"]);
        assert_eq!(db.bucket("new_arrows").get::<Arrow>("b").unwrap().length, 2);
    }

    #[test]
    fn iteration_yields_every_record_once() {
        let db = TestDb::new();
        let arrows = db.bucket("arrows");
        let sample = sample_arrows(300);
        for arrow in &sample {
            arrows.put(arrow).unwrap();
        }

        let mut iter = arrows.iter::<Arrow>().unwrap();
        let mut arrow = Arrow::default();
        let mut seen = Vec::new();
        while iter.advance(&mut arrow) {
            seen.push(arrow.clone());
        }
        assert_eq!(iter.state(), IterState::Exhausted);
        assert_eq!(seen, sample);
    }

    #[test]
    fn compaction_waits_for_open_iterator() {
        let db = TestDb::new();
        let arrows = db.bucket("arrows");
        for round in 0..5 {
            for arrow in sample_arrows(20) {
                arrows.put(&Arrow { length: round, ..arrow }).unwrap();
            }
        }

        let mut iter = arrows.iter::<Arrow>().unwrap();
        assert!(matches!(
            db.compact().unwrap(),
            CompactionOutcome::Deferred { pinned_snapshots: 1 }
        ));

        iter.close();
        let before = db.file_len();
        assert!(db.compact().unwrap().is_compacted());
        assert!(db.file_len() < before);
        assert_eq!(arrows.get::<Arrow>("arrow-0007").unwrap().length, 4);
    }
}
