//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Permission bits used for newly created files when none are configured.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Pause between lock attempts while waiting for a contended file.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Suffix of the scratch file written during [`StorageBackend::replace`].
const REPLACE_SUFFIX: &str = ".compact";

/// Options controlling how a [`FileBackend`] opens its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// Create the file if it does not exist.
    pub create_if_missing: bool,
    /// Unix permission bits applied when the file is created.
    pub mode: u32,
    /// How long to keep retrying when another owner holds the lock.
    ///
    /// `Duration::ZERO` fails on the first contended attempt.
    pub lock_timeout: Duration,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            mode: DEFAULT_FILE_MODE,
            lock_timeout: Duration::ZERO,
        }
    }
}

/// A file-based storage backend holding an exclusive lock on its file.
///
/// The lock is taken on open and released when the backend is dropped, so
/// only one `FileBackend` (in this or any other process) owns a path at a time.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
/// - `replace()` writes a scratch file, syncs it and renames it over the original
///
/// # Example
///
/// ```no_run
/// use bow_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data.bow")).unwrap();
/// backend.append(b"persistent data").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    mode: u32,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens or creates a file backend with default options.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if the file is owned elsewhere.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_options(path, &FileOptions::default())
    }

    /// Opens a file backend with explicit options.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist and `create_if_missing` is false (`NotFound`)
    /// - The lock could not be acquired within `lock_timeout` (`Locked`)
    /// - I/O errors occur
    pub fn open_with_options(path: &Path, options: &FileOptions) -> StorageResult<Self> {
        if !options.create_if_missing && !path.exists() {
            return Err(StorageError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = open_file(path, options.mode, options.create_if_missing, false)?;
        acquire_lock(&file, path, options.lock_timeout)?;

        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opened store file");

        Ok(Self {
            path: path.to_path_buf(),
            mode: options.mode,
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(REPLACE_SUFFIX);
        PathBuf::from(name)
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if data.is_empty() {
            return Ok(*self.size.read());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        let offset = *size;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.write().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.write().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, *size
                ),
            )));
        }

        file.set_len(new_size)?;
        file.sync_all()?;
        *size = new_size;

        Ok(())
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        let scratch = self.scratch_path();

        let mut replacement = open_file(&scratch, self.mode, true, true)?;
        replacement.write_all(data)?;
        replacement.sync_all()?;
        // Lock before the rename so the path is never observable unlocked.
        acquire_lock(&replacement, &scratch, Duration::ZERO)?;

        let mut file = self.file.write();
        let mut size = self.size.write();

        fs::rename(&scratch, &self.path)?;
        sync_parent_dir(&self.path)?;

        *file = replacement;
        *size = data.len() as u64;

        Ok(())
    }
}

fn open_file(path: &Path, mode: u32, create: bool, truncate: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options
        .read(true)
        .write(true)
        .create(create)
        .truncate(truncate);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

fn acquire_lock(file: &File, path: &Path, timeout: Duration) -> StorageResult<()> {
    let deadline = Instant::now() + timeout;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(e) if is_contended(&e) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(StorageError::Locked {
                        path: path.to_path_buf(),
                    });
                }
                debug!(path = %path.display(), "store file locked elsewhere, retrying");
                thread::sleep(LOCK_RETRY_INTERVAL.min(deadline - now));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    // NTFS journals the rename.
    Ok(())
}
