//! Compact command implementation.

use bow_core::CompactionOutcome;
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, settings: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, settings, false)?;
    println!("Compacting {}", path.display());

    match db.compact()? {
        CompactionOutcome::Compacted {
            bytes_before,
            bytes_after,
            records,
        } => {
            let saved = bytes_before.saturating_sub(bytes_after);
            println!("  Records kept: {records}");
            println!("  Size before:  {bytes_before} bytes");
            println!("  Size after:   {bytes_after} bytes");
            println!(
                "  Space saved:  {saved} bytes ({:.1}%)",
                if bytes_before > 0 {
                    saved as f64 / bytes_before as f64 * 100.0
                } else {
                    0.0
                }
            );
        }
        CompactionOutcome::Deferred { pinned_snapshots } => {
            println!("Compaction deferred: {pinned_snapshots} snapshots pinned");
        }
    }

    Ok(())
}
