//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use bow_core::{CborCodec, Codec, Database, Options};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file-backed test database in a temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct TestDb<C: Codec + Clone = CborCodec> {
    db: Database<C>,
    options: Options<C>,
    path: PathBuf,
    _dir: TempDir,
}

impl TestDb<CborCodec> {
    /// Creates a database with default options.
    pub fn new() -> Self {
        Self::with_options(Options::new())
    }
}

impl Default for TestDb<CborCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec + Clone> TestDb<C> {
    /// Creates a database with the given options.
    pub fn with_options(options: Options<C>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("test.bow");
        let db = Database::open_with(&path, options.clone()).expect("Failed to open database");
        Self {
            db,
            options,
            path,
            _dir: dir,
        }
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the size of the database file.
    pub fn file_len(&self) -> u64 {
        std::fs::metadata(&self.path)
            .expect("Failed to stat database file")
            .len()
    }

    /// Closes the database without reopening it.
    ///
    /// The file can then be modified directly, e.g. by the helpers in
    /// [`crash`](crate::crash), before calling [`reopen`](Self::reopen).
    pub fn close(&self) {
        self.db.close().expect("Failed to close database");
    }

    /// Closes and reopens the database with the same options.
    pub fn reopen(&mut self) {
        self.db.close().expect("Failed to close database");
        self.db = Database::open_with(&self.path, self.options.clone())
            .expect("Failed to reopen database");
    }

    /// Tries to reopen the database, returning the error instead of panicking.
    pub fn try_reopen(&mut self) -> bow_core::CoreResult<()> {
        self.db.close()?;
        self.db = Database::open_with(&self.path, self.options.clone())?;
        Ok(())
    }

    /// Closes the database and reopens the same file with other options.
    pub fn reopen_with<D: Codec + Clone>(self, options: Options<D>) -> TestDb<D> {
        let TestDb { db, path, _dir, .. } = self;
        db.close().expect("Failed to close database");
        drop(db);
        let db = Database::open_with(&path, options.clone()).expect("Failed to reopen database");
        TestDb {
            db,
            options,
            path,
            _dir,
        }
    }
}

impl<C: Codec + Clone> std::ops::Deref for TestDb<C> {
    type Target = Database<C>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use bow_testkit::{with_temp_db, Arrow};
///
/// with_temp_db(|db| {
///     db.bucket("arrows").put(&Arrow::new("1", 2)).unwrap();
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    f(&db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDb::new();
    f(&test_db, test_db.path())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use crate::models::sample_arrows;

    /// Creates a database whose `arrows` bucket holds `count` sample arrows.
    pub fn populated(count: usize) -> TestDb {
        let db = TestDb::new();
        let arrows = db.bucket("arrows");
        for arrow in sample_arrows(count) {
            arrows.put(&arrow).expect("Failed to put arrow");
        }
        db
    }
}
