//! Property-based test generators using proptest.
//!
//! Provides strategies for generating records, keys and operation
//! sequences.

use crate::models::{Arrow, Quiver};
use proptest::prelude::*;

/// Strategy for bucket names.
pub fn bucket_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid regex")
}

/// Strategy for arrow ids drawn from a small pool, so that generated
/// operations often hit the same key.
pub fn arrow_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-d][0-9]").expect("valid regex")
}

/// Strategy for arrows.
///
/// Sharpness is a multiple of 0.25 so it survives JSON and CBOR unchanged.
pub fn arrow_strategy() -> impl Strategy<Value = Arrow> {
    (arrow_id_strategy(), any::<i64>(), 0u8..=4).prop_map(|(id, length, quarters)| Arrow {
        id,
        length,
        sharpness: f64::from(quarters) / 4.0,
    })
}

/// Strategy for quivers.
pub fn quiver_strategy() -> impl Strategy<Value = Quiver> {
    (
        any::<i64>(),
        prop::collection::vec(arrow_id_strategy(), 0..4),
    )
        .prop_map(|(id, arrows)| Quiver { id, arrows })
}

/// A mutation of the `arrows` bucket.
#[derive(Debug, Clone)]
pub enum ArrowOp {
    /// Insert or replace an arrow.
    Put(Arrow),
    /// Delete the arrow with this id.
    Delete(String),
}

/// Strategy for a single arrow operation.
pub fn arrow_op_strategy() -> impl Strategy<Value = ArrowOp> {
    prop_oneof![
        3 => arrow_strategy().prop_map(ArrowOp::Put),
        1 => arrow_id_strategy().prop_map(ArrowOp::Delete),
    ]
}

/// Strategy for a sequence of arrow operations.
pub fn arrow_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<ArrowOp>> {
    prop::collection::vec(arrow_op_strategy(), 0..max_len)
}
