//! Rebuilding in-memory state from the store file.

use super::directory::BucketDirectory;
use super::index::{Slot, ValueRef, VersionIndex};
use crate::error::{CoreError, CoreResult};
use crate::log::{FileHeader, LogEntry, LogReader, LogRecord};
use crate::types::{BucketId, SequenceNumber};
use bow_storage::StorageBackend;
use tracing::{debug, warn};

/// State rebuilt from the log.
#[derive(Debug, Default)]
pub(crate) struct Recovered {
    pub index: VersionIndex,
    pub directory: BucketDirectory,
    pub committed: SequenceNumber,
    pub commits: u64,
}

/// Replays every committed transaction after the file header.
///
/// Records after the last commit are cut off with a warning. Checksum and
/// format errors inside the committed region are fatal.
pub(crate) fn recover(backend: &mut dyn StorageBackend) -> CoreResult<Recovered> {
    let mut state = Recovered::default();
    let mut pending: Vec<LogEntry> = Vec::new();
    let mut valid_end = FileHeader::SIZE as u64;

    let torn_at = {
        let mut reader = LogReader::new(&*backend, valid_end)?;
        for entry in reader.by_ref() {
            let entry = entry?;
            if let LogRecord::Commit { sequence } = entry.record {
                if sequence < state.committed {
                    return Err(CoreError::corruption(format!(
                        "commit {sequence} at offset {} follows {}",
                        entry.offset, state.committed
                    )));
                }
                for op in pending.drain(..) {
                    apply(&mut state, op, sequence)?;
                }
                state.committed = sequence;
                state.commits += 1;
                valid_end = entry.end();
            } else {
                pending.push(entry);
            }
        }
        reader.torn_at()
    };

    let size = backend.size()?;
    if valid_end < size {
        warn!(
            discarded_bytes = size - valid_end,
            uncommitted_records = pending.len(),
            torn_record = torn_at.is_some(),
            "discarding incomplete transaction at end of store file"
        );
        backend.truncate(valid_end)?;
        backend.sync()?;
    }

    let pruned = state.index.prune(state.committed);
    debug!(
        commits = state.commits,
        sequence = state.committed.as_u64(),
        pruned,
        "recovery complete"
    );
    Ok(state)
}

fn apply(state: &mut Recovered, entry: LogEntry, seq: SequenceNumber) -> CoreResult<()> {
    let offset = entry.offset;
    match entry.record {
        LogRecord::CreateBucket { bucket, name } => {
            debug!(%bucket, name = %name, "recovered bucket");
            state.directory.register(bucket, name, seq)
        }
        LogRecord::Put { bucket, key, value } => {
            ensure_bucket(state, bucket, offset)?;
            let value = ValueRef {
                offset: offset + LogRecord::put_value_offset(key.len()) as u64,
                len: value.len() as u32,
            };
            state.index.insert(bucket, key, seq, Slot::Value(value));
            Ok(())
        }
        LogRecord::Delete { bucket, key } => {
            ensure_bucket(state, bucket, offset)?;
            state.index.insert(bucket, key, seq, Slot::Tombstone);
            Ok(())
        }
        LogRecord::Commit { .. } => Ok(()),
    }
}

fn ensure_bucket(state: &Recovered, bucket: BucketId, offset: u64) -> CoreResult<()> {
    if state.directory.contains(bucket) {
        Ok(())
    } else {
        Err(CoreError::corruption(format!(
            "record at offset {offset} targets unknown {bucket}"
        )))
    }
}
