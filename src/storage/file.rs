//! JSON-file-based storage backend.
//!
//! Stores each key in its own `<key>.json` file under a configurable
//! directory (default: `$XDG_DATA_HOME/fintrack/`).

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::error::{FinanceError, Result};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "fintrack";

/// Environment variable overriding the data directory.
const DATA_DIR_ENV: &str = "FINTRACK_DATA_DIR";

/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed storage that keeps one JSON file per key.
///
/// In-process access is serialized with a [`Mutex`]. Cross-process safety
/// comes from an advisory lock on `storage.lock` (using
/// [`std::fs::File::lock`] / [`std::fs::File::lock_shared`]).
///
/// Reads take a shared lock and writes an exclusive one. Writes go to a
/// temporary file that is then renamed over the target, so a crash never
/// leaves a half-written state file behind.
///
/// # Directory layout
///
/// ```text
/// <dir>/
///   financeState.json
///   storage.lock          (cross-process lock sentinel)
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory for all data files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist and opens
    /// (or creates) the `storage.lock` sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/fintrack/` (typically
    /// `~/.local/share/fintrack/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                FinanceError::Storage("could not determine platform data directory".into())
            })
    }

    /// Resolves the data directory: an explicit path wins, then the
    /// `FINTRACK_DATA_DIR` environment variable, then [`Self::default_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if no explicit path or environment override is
    /// given and the platform data directory cannot be determined.
    #[inline]
    pub fn resolve_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir);
        }
        match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => Self::default_dir(),
        }
    }

    /// Root directory of this storage.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the data file path for a key.
    ///
    /// Keys are restricted to ASCII alphanumerics, `-` and `_` so they can
    /// never escape the storage directory.
    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if valid {
            Ok(self.dir.join(format!("{key}.json")))
        } else {
            Err(FinanceError::Storage(
                format!("invalid storage key: {key:?}").into(),
            ))
        }
    }

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // An unlock failure is reported only when `op` itself succeeded.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }
}

impl super::StateStorage for FileStorage {
    #[inline]
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key)?;
        self.with_shared_lock(|| match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        })
    }

    #[inline]
    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key)?;
        let tmp_path = path.with_extension("json.tmp");
        self.with_exclusive_lock(|| {
            fs::write(&tmp_path, value).map_err(storage_io_error)?;
            fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
            tracing::trace!(key, bytes = value.len(), "wrote state file");
            Ok(())
        })
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        self.with_exclusive_lock(|| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_io_error(err)),
        })
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`FinanceError::Storage`].
fn storage_io_error(err: std::io::Error) -> FinanceError {
    FinanceError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`FinanceError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> FinanceError {
    FinanceError::Storage(err.to_string().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StateStorage as _;

    /// Helper to create a [`FileStorage`] in a temporary directory.
    fn temp_storage() -> (FileStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (storage, dir)
    }

    #[test]
    fn new_creates_dir_and_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert!(nested.join(LOCK_FILE).exists());
        assert_eq!(storage.dir(), nested.as_path());
    }

    #[test]
    fn read_missing_returns_none() {
        let (storage, _dir) = temp_storage();
        assert_eq!(storage.read("financeState").unwrap(), None);
    }

    #[test]
    fn write_then_read_round_trips() {
        let (storage, dir) = temp_storage();
        storage.write("financeState", r#"{"darkMode":true}"#).unwrap();
        assert_eq!(
            storage.read("financeState").unwrap().as_deref(),
            Some(r#"{"darkMode":true}"#)
        );
        assert!(dir.path().join("financeState.json").exists());
        assert!(!dir.path().join("financeState.json.tmp").exists());
    }

    #[test]
    fn write_overwrites() {
        let (storage, _dir) = temp_storage();
        storage.write("financeState", "1").unwrap();
        storage.write("financeState", "2").unwrap();
        assert_eq!(storage.read("financeState").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_deletes_and_tolerates_missing() {
        let (storage, dir) = temp_storage();
        storage.write("financeState", "{}").unwrap();
        storage.remove("financeState").unwrap();
        storage.remove("financeState").unwrap();
        assert!(!dir.path().join("financeState.json").exists());
        assert!(dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let (storage, _dir) = temp_storage();
        for key in ["", "../escape", "a/b", "with space"] {
            let err = storage.write(key, "x").unwrap_err();
            assert!(matches!(err, FinanceError::Storage(_)), "{key}");
        }
    }

    #[test]
    fn reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
            storage.write("financeState", "persisted").unwrap();
        }
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            storage.read("financeState").unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn resolve_dir_prefers_explicit() {
        let explicit = PathBuf::from("/tmp/fintrack-explicit");
        assert_eq!(
            FileStorage::resolve_dir(Some(explicit.clone())).unwrap(),
            explicit
        );
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(dir) = FileStorage::default_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
