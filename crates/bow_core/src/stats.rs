//! Database statistics.

use bow_codec::Format;

/// A point-in-time summary of a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Sequence number of the last commit.
    pub sequence: u64,
    /// Size of the store file in bytes.
    pub file_size: u64,
    /// Codec format recorded in the file header.
    pub format: Format,
    /// Buckets in creation order.
    pub buckets: Vec<BucketStats>,
    /// Versions held by the index, including ones kept for open readers.
    pub versions: usize,
    /// Read snapshots currently pinned by iterators.
    pub pinned_snapshots: usize,
}

impl DatabaseStats {
    /// Total live records across buckets.
    #[must_use]
    pub fn records(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.records).sum()
    }
}

/// Per-bucket statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStats {
    /// Bucket name.
    pub name: String,
    /// Number of live records.
    pub records: usize,
}
