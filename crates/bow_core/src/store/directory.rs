//! Bucket name registry.

use crate::error::{CoreError, CoreResult};
use crate::types::{BucketId, SequenceNumber};
use std::collections::{BTreeMap, HashMap};

/// A registered bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BucketEntry {
    pub id: BucketId,
    pub name: String,
    /// Commit that created the bucket.
    pub created: SequenceNumber,
}

/// Maps bucket names to IDs.
///
/// A bucket exists for snapshots at or after the commit that created it.
#[derive(Debug, Default)]
pub(crate) struct BucketDirectory {
    entries: BTreeMap<BucketId, BucketEntry>,
    by_name: HashMap<String, BucketId>,
}

impl BucketDirectory {
    /// Looks up a bucket regardless of snapshot.
    pub fn lookup(&self, name: &str) -> Option<BucketId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a bucket as of `snapshot`.
    pub fn lookup_at(&self, name: &str, snapshot: SequenceNumber) -> Option<BucketId> {
        let id = self.lookup(name)?;
        let entry = self.entries.get(&id)?;
        (entry.created <= snapshot).then_some(id)
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: BucketId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registers a bucket.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if the name or ID is already taken.
    pub fn register(&mut self, id: BucketId, name: String, created: SequenceNumber) -> CoreResult<()> {
        if self.entries.contains_key(&id) || self.by_name.contains_key(&name) {
            return Err(CoreError::corruption(format!(
                "bucket `{name}` ({id}) registered twice"
            )));
        }
        self.by_name.insert(name.clone(), id);
        self.entries.insert(id, BucketEntry { id, name, created });
        Ok(())
    }

    /// Returns the ID the next new bucket gets.
    pub fn next_id(&self) -> BucketId {
        self.entries
            .keys()
            .next_back()
            .map_or(BucketId::new(1), |last| BucketId::new(last.as_u32() + 1))
    }

    /// Returns the buckets visible at `snapshot` in creation order.
    pub fn names_at(&self, snapshot: SequenceNumber) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.created <= snapshot)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Iterates every bucket in creation order.
    pub fn entries(&self) -> impl Iterator<Item = &BucketEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_creation_order() {
        let mut dir = BucketDirectory::default();
        assert_eq!(dir.next_id(), BucketId::new(1));
        dir.register(BucketId::new(1), "arrows".into(), SequenceNumber::new(1))
            .unwrap();
        assert_eq!(dir.next_id(), BucketId::new(2));
        dir.register(BucketId::new(2), "new_arrows".into(), SequenceNumber::new(3))
            .unwrap();

        assert_eq!(dir.names_at(SequenceNumber::new(3)), ["arrows", "new_arrows"]);
        assert_eq!(dir.names_at(SequenceNumber::new(2)), ["arrows"]);
    }

    #[test]
    fn lookup_respects_snapshot() {
        let mut dir = BucketDirectory::default();
        dir.register(BucketId::new(1), "arrows".into(), SequenceNumber::new(5))
            .unwrap();
        assert_eq!(dir.lookup("arrows"), Some(BucketId::new(1)));
        assert_eq!(dir.lookup_at("arrows", SequenceNumber::new(4)), None);
        assert_eq!(
            dir.lookup_at("arrows", SequenceNumber::new(5)),
            Some(BucketId::new(1))
        );
        assert_eq!(dir.lookup("quivers"), None);
    }

    #[test]
    fn duplicate_registration_is_corruption() {
        let mut dir = BucketDirectory::default();
        dir.register(BucketId::new(1), "arrows".into(), SequenceNumber::new(1))
            .unwrap();
        assert!(dir
            .register(BucketId::new(2), "arrows".into(), SequenceNumber::new(2))
            .is_err());
        assert!(dir
            .register(BucketId::new(1), "other".into(), SequenceNumber::new(2))
            .is_err());
    }
}
