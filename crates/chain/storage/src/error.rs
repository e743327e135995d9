use thiserror::Error;

/// Errors that may occur while interacting with state storage.
///
/// This enum is used across all implementations of the [`StateStore`](crate::StateStore) trait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The expected entry was not found in the store.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// A write would overwrite an existing entry with different content.
    #[error("conflict error: {0}")]
    ConflictError(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("state store lock poisoned")]
    Poisoned,
}
