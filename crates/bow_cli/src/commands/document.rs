//! Put and get command implementations.

use bow_core::{KeyBytes, KeySchema};
use serde_json::Value;
use std::path::Path;

/// Parses `document` as JSON and stores it under the value of `key_field`.
pub fn put(
    path: &Path,
    settings: &[String],
    bucket: &str,
    key_field: &str,
    document: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, true)?;
    let key = store(&db, bucket, key_field, document)?;
    println!("stored {key} in {bucket}");
    Ok(())
}

/// Prints the record under `key` as pretty JSON.
pub fn get(
    path: &Path,
    settings: &[String],
    bucket: &str,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, false)?;
    let doc = load(&db, bucket, key)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn store<C: bow_core::Codec>(
    db: &bow_core::Database<C>,
    bucket: &str,
    key_field: &str,
    document: &str,
) -> Result<KeyBytes, Box<dyn std::error::Error>> {
    let doc: Value = serde_json::from_str(document)?;
    let key = KeySchema::new(key_field).extract(&doc)?;
    db.bucket(bucket).put_encoded(&key, &doc)?;
    Ok(key)
}

fn load<C: bow_core::Codec>(
    db: &bow_core::Database<C>,
    bucket: &str,
    key: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    let key = KeySchema::parse_key(key)?;
    Ok(db.bucket(bucket).get_value::<Value, _>(&key)?)
}
