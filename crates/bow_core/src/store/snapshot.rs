//! Registry of pinned read snapshots.

use crate::types::SequenceNumber;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug)]
struct RegistryState {
    committed: SequenceNumber,
    pins: BTreeMap<SequenceNumber, usize>,
}

/// Tracks the committed sequence and every snapshot readers hold.
///
/// Pinning and publishing share one lock, so a reader can never pin a
/// sequence that a concurrent prune already considered unreachable.
#[derive(Debug)]
pub(crate) struct SnapshotRegistry {
    state: Mutex<RegistryState>,
}

impl SnapshotRegistry {
    pub fn new(committed: SequenceNumber) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                committed,
                pins: BTreeMap::new(),
            }),
        }
    }

    /// Pins the current committed sequence and returns it.
    pub fn pin(&self) -> SequenceNumber {
        let mut state = self.state.lock();
        let seq = state.committed;
        *state.pins.entry(seq).or_insert(0) += 1;
        seq
    }

    /// Releases one pin of `seq`.
    pub fn unpin(&self, seq: SequenceNumber) {
        let mut state = self.state.lock();
        if let Some(count) = state.pins.get_mut(&seq) {
            *count -= 1;
            if *count == 0 {
                state.pins.remove(&seq);
            }
        }
    }

    /// Returns the last committed sequence.
    pub fn committed(&self) -> SequenceNumber {
        self.state.lock().committed
    }

    /// Makes `seq` the committed sequence and returns the prune horizon.
    pub fn publish(&self, seq: SequenceNumber) -> SequenceNumber {
        let mut state = self.state.lock();
        state.committed = seq;
        Self::horizon_of(&state)
    }

    /// Returns how many snapshots are pinned.
    pub fn pinned(&self) -> usize {
        self.state.lock().pins.values().sum()
    }

    fn horizon_of(state: &RegistryState) -> SequenceNumber {
        state
            .pins
            .keys()
            .next()
            .copied()
            .unwrap_or(state.committed)
    }
}
