//! Database facade.

use crate::bucket::Bucket;
use crate::config::Options;
use crate::error::{CoreError, CoreResult};
use crate::stats::DatabaseStats;
use crate::store::{CompactionOutcome, Store};
use bow_codec::{CborCodec, Codec, Format};
use bow_storage::{FileBackend, InMemoryBackend};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// State shared by a database and every handle derived from it.
pub(crate) struct Shared<C> {
    pub(crate) store: Arc<Store>,
    pub(crate) codec: C,
}

/// An open bow database.
///
/// A database is one file holding any number of named [`Bucket`]s. The
/// file is locked exclusively while the database is open.
///
/// # Example
///
/// ```rust,no_run
/// use bow_core::{Database, Options};
/// use std::time::Duration;
///
/// let db = Database::open_with(
///     "arrows.bow",
///     Options::new().lock_timeout(Duration::from_millis(250)),
/// )?;
/// println!("{:?}", db.buckets()?);
/// db.close()?;
/// # Ok::<(), bow_core::CoreError>(())
/// ```
pub struct Database<C: Codec = CborCodec> {
    shared: Arc<Shared<C>>,
    path: Option<PathBuf>,
}

impl Database<CborCodec> {
    /// Opens or creates a database file with default options.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OpenFailed`] if the file is locked by another
    /// owner or cannot be opened, and a corruption error if its contents
    /// are damaged.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with(path, Options::default())
    }

    /// Creates a database that lives only in memory.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with(Options::default())
    }
}

impl<C: Codec> Database<C> {
    /// Opens or creates a database file.
    ///
    /// # Errors
    ///
    /// See [`Database::open`].
    pub fn open_with(path: impl AsRef<Path>, options: Options<C>) -> CoreResult<Self> {
        let path = path.as_ref();
        let backend = FileBackend::open_with_options(path, &options.file_options()).map_err(
            |source| CoreError::OpenFailed {
                path: path.to_path_buf(),
                source,
            },
        )?;

        let format = options.codec.format();
        let store = Store::open(Box::new(backend), format, options.sync_on_commit)?;
        info!(
            path = %path.display(),
            codec = %format,
            sequence = store.committed().as_u64(),
            "database opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                codec: options.codec,
            }),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates a database that lives only in memory, with the given codec.
    pub fn open_in_memory_with(options: Options<C>) -> CoreResult<Self> {
        let store = Store::open(
            Box::new(InMemoryBackend::new()),
            options.codec.format(),
            options.sync_on_commit,
        )?;
        Ok(Self {
            shared: Arc::new(Shared {
                store,
                codec: options.codec,
            }),
            path: None,
        })
    }

    /// Returns a handle to the named bucket.
    ///
    /// The bucket is created by its first write; obtaining a handle does
    /// not touch the file.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Bucket<C> {
        Bucket::new(name, Arc::clone(&self.shared))
    }

    /// Lists bucket names in creation order.
    pub fn buckets(&self) -> CoreResult<Vec<String>> {
        self.shared.store.begin_read()?.buckets()
    }

    /// Returns statistics about the database.
    pub fn stats(&self) -> CoreResult<DatabaseStats> {
        self.shared.store.stats()
    }

    /// Rewrites the file with only live records.
    ///
    /// Returns [`CompactionOutcome::Deferred`] while any iterator holds a
    /// snapshot.
    pub fn compact(&self) -> CoreResult<CompactionOutcome> {
        self.shared.store.compact()
    }

    /// Closes the database and releases the file lock.
    ///
    /// Waits for an in-flight write. Closing twice is a no-op; every other
    /// operation on this database, its buckets and open iterators then
    /// fails with [`CoreError::DatabaseClosed`].
    pub fn close(&self) -> CoreResult<()> {
        if self.shared.store.is_closed() {
            return Ok(());
        }
        self.shared.store.close()?;
        match &self.path {
            Some(path) => info!(path = %path.display(), "database closed"),
            None => info!("in-memory database closed"),
        }
        Ok(())
    }

    /// Returns true until [`close`](Self::close) is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.shared.store.is_closed()
    }

    /// Returns the file path, or `None` for an in-memory database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> &C {
        &self.shared.codec
    }

    /// Returns the codec format recorded when the file was created.
    ///
    /// May differ from [`codec`](Self::codec) if the file was reopened with
    /// another codec; reads of existing records then fail with
    /// [`CoreError::Codec`].
    #[must_use]
    pub fn stored_format(&self) -> Format {
        self.shared.store.stored_format()
    }
}

impl<C: Codec> Drop for Database<C> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close database");
        }
    }
}

impl<C: Codec> fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("format", &self.shared.codec.format())
            .field("store", &self.shared.store)
            .finish()
    }
}
