//! Concurrency stress helpers.
//!
//! Runs writer and reader threads against one database and checks that
//! every scan observes a consistent snapshot.

use crate::models::Arrow;
use bow_core::{Codec, CoreResult, Database};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Configuration for a stress run.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    /// Number of writer threads.
    pub writers: usize,
    /// Number of reader threads.
    pub readers: usize,
    /// Puts per writer thread.
    pub puts_per_writer: usize,
    /// Full scans per reader thread.
    pub scans_per_reader: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writers: 4,
            readers: 4,
            puts_per_writer: 100,
            scans_per_reader: 20,
        }
    }
}

/// Counters collected during a stress run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressResult {
    /// Records written.
    pub puts: usize,
    /// Point reads that found the record just written.
    pub reads: usize,
    /// Completed full scans.
    pub scans: usize,
}

/// Runs concurrent writers and readers against the `arrows` bucket.
///
/// Writers put distinct keys and read each one back. Readers scan the
/// bucket and assert that each scan is sorted and never smaller than the
/// previous one, since nothing is deleted.
pub fn run_stress<C: Codec>(db: &Database<C>, config: StressConfig) -> CoreResult<StressResult> {
    let puts = AtomicUsize::new(0);
    let reads = AtomicUsize::new(0);
    let scans = AtomicUsize::new(0);

    thread::scope(|scope| {
        let mut handles = Vec::new();

        for writer in 0..config.writers {
            let (puts, reads) = (&puts, &reads);
            handles.push(scope.spawn(move || -> CoreResult<()> {
                let arrows = db.bucket("arrows");
                for n in 0..config.puts_per_writer {
                    let arrow = Arrow::new(format!("w{writer:02}-{n:05}"), n as i64);
                    arrows.put(&arrow)?;
                    puts.fetch_add(1, Ordering::Relaxed);
                    if arrows.get::<Arrow>(arrow.id.as_str())? == arrow {
                        reads.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(())
            }));
        }

        for _ in 0..config.readers {
            let scans = &scans;
            handles.push(scope.spawn(move || -> CoreResult<()> {
                let arrows = db.bucket("arrows");
                let mut last_len = 0;
                for _ in 0..config.scans_per_reader {
                    let ids = arrows
                        .iter::<Arrow>()?
                        .map(|arrow| arrow.map(|arrow| arrow.id))
                        .collect::<CoreResult<Vec<_>>>()?;
                    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
                    assert!(ids.len() >= last_len);
                    last_len = ids.len();
                    scans.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            }));
        }

        handles
            .into_iter()
            .try_for_each(|handle| handle.join().expect("stress thread panicked"))
    })?;

    Ok(StressResult {
        puts: puts.into_inner(),
        reads: reads.into_inner(),
        scans: scans.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestDb;
    use bow_core::Options;

    #[test]
    fn concurrent_writers_and_readers_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let config = StressConfig::default();
        let result = run_stress(&db, config).unwrap();

        let total = config.writers * config.puts_per_writer;
        assert_eq!(result.puts, total);
        assert_eq!(result.reads, total);
        assert_eq!(result.scans, config.readers * config.scans_per_reader);
        assert_eq!(db.bucket("arrows").len().unwrap(), total);
    }

    #[test]
    fn concurrent_writers_and_readers_on_file() {
        let mut db = TestDb::with_options(Options::new().sync_on_commit(false));
        let config = StressConfig {
            writers: 2,
            readers: 2,
            puts_per_writer: 50,
            scans_per_reader: 10,
        };
        run_stress(&db, config).unwrap();

        db.reopen();
        assert_eq!(db.bucket("arrows").len().unwrap(), 100);
        assert_eq!(db.stats().unwrap().pinned_snapshots, 0);
    }
}
