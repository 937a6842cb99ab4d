//! Port for browser-style local/session storage.

use crate::domain::errors::StorageError;

/// String key/value storage. Operations are synchronous, like the browser
/// storage API the stores are modelled on.
pub trait KeyValuePort: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value.
    ///
    /// # Errors
    /// Returns `StorageError::QuotaExceeded` when the write does not fit, or
    /// an I/O error from the backend.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes a value.
    ///
    /// # Errors
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
