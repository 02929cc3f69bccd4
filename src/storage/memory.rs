//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! [`super::StateStorage`]. Useful for unit tests and for front ends that
//! do not want anything written to disk.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{FinanceError, Result};

/// Thread-safe in-memory key/value storage.
///
/// Besides the stored values it counts successful writes, which lets tests
/// check that the store persisted after a dispatch.
///
/// # Example
///
/// ```rust
/// use fintrack::storage::{InMemoryStorage, StateStorage as _};
///
/// let storage = InMemoryStorage::new();
/// storage.write("financeState", "{}").unwrap();
/// assert_eq!(storage.read("financeState").unwrap().as_deref(), Some("{}"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<Inner>,
}

/// Inner mutable state.
#[derive(Debug, Default)]
struct Inner {
    /// Stored values by key.
    values: HashMap<String, String>,
    /// Number of successful writes.
    writes: usize,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-seeded with one value.
    #[inline]
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut inner = Inner::default();
        let _old = inner.values.insert(key.to_owned(), value.to_owned());
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Number of successful writes so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal mutex is poisoned.
    #[inline]
    pub fn write_count(&self) -> Result<usize> {
        self.with_lock(|inner| inner.writes)
    }

    /// Acquires the mutex and applies `f` to the inner state.
    fn with_lock<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| FinanceError::Storage(err.to_string().into()))?;
        Ok(f(&mut guard))
    }
}

impl super::StateStorage for InMemoryStorage {
    #[inline]
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.with_lock(|inner| inner.values.get(key).cloned())
    }

    #[inline]
    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.with_lock(|inner| {
            let _old = inner.values.insert(key.to_owned(), value.to_owned());
            inner.writes += 1;
        })
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        self.with_lock(|inner| {
            let _old = inner.values.remove(key);
        })
    }
}
