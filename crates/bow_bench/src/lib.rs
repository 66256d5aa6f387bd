//! Benchmark utilities.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Record used by the benchmarks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Key.
    pub id: u64,
    /// Short label.
    pub label: String,
    /// Random bytes.
    pub data: Vec<u8>,
}

bow_core::impl_record!(Payload, id: u64);

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` payloads with sequential ids.
pub fn generate_payloads(count: usize, size: usize) -> Vec<Payload> {
    (0..count as u64)
        .map(|id| Payload {
            id,
            label: format!("payload-{id}"),
            data: random_data(size),
        })
        .collect()
}
