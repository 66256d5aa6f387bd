//! Dump command implementation.

use bow_core::KeyBytes;
use serde_json::Value;
use std::path::Path;

/// Prints `key<TAB>document` for each record of the bucket, in key order.
pub fn run(
    path: &Path,
    settings: &[String],
    bucket: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, false)?;
    let mut iter = db.bucket(bucket).iter::<Value>()?;
    let mut printed = 0;

    while limit.map_or(true, |limit| printed < limit) {
        let Some(doc) = iter.next() else { break };
        let doc = doc?;
        let key = iter
            .current_key()
            .map(|key| KeyBytes::from_vec(key.to_vec()))
            .transpose()?;
        match key {
            Some(key) => println!("{key}\t{doc}"),
            None => println!("{doc}"),
        }
        printed += 1;
    }

    iter.close();
    Ok(())
}
