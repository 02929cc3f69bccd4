//! Pluggable key/value backends for persisting the state tree.
//!
//! The store serializes its whole state to a JSON string and hands it to a
//! [`StateStorage`] under a fixed key. Backends only move strings around;
//! they never look inside the payload.

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use crate::error::Result;

/// Blocking string key/value storage.
///
/// Methods take `&self`; implementations use interior mutability so a
/// backend can be shared between threads.
pub trait StateStorage: core::fmt::Debug + Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value stored under `key`. Removing a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to delete.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: StateStorage + ?Sized> StateStorage for Box<T> {
    #[inline]
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    #[inline]
    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
