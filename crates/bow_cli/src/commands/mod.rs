//! CLI command implementations.

pub mod compact;
pub mod document;
pub mod dump;
pub mod inspect;

use bow_core::{Database, FormatCodec, Options};
use std::path::Path;
use tracing::debug;

/// Opens the database with the `-o key=value` settings applied.
///
/// Only `put` creates a missing file unless `create_if_missing` is given.
pub fn open(
    path: &Path,
    settings: &[String],
    create: bool,
) -> Result<Database<FormatCodec>, Box<dyn std::error::Error>> {
    debug!(path = %path.display(), create, "opening database");
    let create = if create { "true" } else { "false" };
    let mut pairs = vec![("create_if_missing", create)];
    for setting in settings {
        pairs.push(Options::<FormatCodec>::split_pair(setting)?);
    }
    Ok(Database::open_with(path, Options::<FormatCodec>::from_pairs(pairs)?)?)
}
