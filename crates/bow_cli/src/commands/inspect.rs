//! Inspect and buckets command implementations.

use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Codec format recorded in the file header.
    pub format: String,
    /// Last committed sequence number.
    pub sequence: u64,
    /// Live records across all buckets.
    pub records: usize,
    /// Versions held in the index.
    pub versions: usize,
    /// Buckets in creation order.
    pub buckets: Vec<BucketSummary>,
}

/// Statistics for a single bucket.
#[derive(Debug, Serialize)]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Number of live records.
    pub records: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, settings: &[String], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, false)?;
    let stats = db.stats()?;

    let result = InspectResult {
        path: path.display().to_string(),
        file_size: stats.file_size,
        format: stats.format.to_string(),
        sequence: stats.sequence,
        records: stats.records(),
        versions: stats.versions,
        buckets: stats
            .buckets
            .into_iter()
            .map(|bucket| BucketSummary {
                name: bucket.name,
                records: bucket.records,
            })
            .collect(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

/// Runs the buckets command.
pub fn buckets(path: &Path, settings: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, false)?;
    for name in db.buckets()? {
        println!("{name}");
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Database: {}", result.path);
    println!("  File size: {} bytes", result.file_size);
    println!("  Format:    {}", result.format);
    println!("  Sequence:  {}", result.sequence);
    println!("  Records:   {}", result.records);
    println!("  Versions:  {}", result.versions);

    if !result.buckets.is_empty() {
        println!();
        println!("Buckets:");
        for bucket in &result.buckets {
            println!("  {:<24} {} records", bucket.name, bucket.records);
        }
    }
}
