//! Sample record types.

use bow_core::{impl_record, Id};
use serde::{Deserialize, Serialize};

/// A record keyed by a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    /// Key.
    pub id: String,
    /// Length in centimetres.
    pub length: i64,
    /// Sharpness between 0 and 1.
    pub sharpness: f64,
}

impl_record!(Arrow, id: str);

impl Arrow {
    /// Creates an arrow with sharpness 1.
    pub fn new(id: impl Into<String>, length: i64) -> Self {
        Self {
            id: id.into(),
            length,
            sharpness: 1.0,
        }
    }
}

/// A record keyed by a signed integer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quiver {
    /// Key.
    pub id: i64,
    /// IDs of the arrows it holds.
    pub arrows: Vec<String>,
}

impl_record!(Quiver, id: i64);

/// A record keyed by a random [`Id`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Armory {
    /// Key.
    pub id: Id,
    /// Display name.
    pub name: String,
    /// IDs of the quivers it stores.
    pub quivers: Vec<i64>,
}

impl_record!(Armory, id: Id);

/// Returns `count` arrows with ids `arrow-0000`, `arrow-0001`, ...
pub fn sample_arrows(count: usize) -> Vec<Arrow> {
    (0..count)
        .map(|n| Arrow::new(format!("arrow-{n:04}"), n as i64))
        .collect()
}
