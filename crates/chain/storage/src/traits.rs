use crate::StorageError;
use hotcold_primitives::{BeaconState, BlockSlotKey, Root};
use std::fmt::Debug;

/// Provides an interface for persisting and loading state snapshots.
///
/// Snapshots are addressed by their state root. Each snapshot is also bound to
/// the [`BlockSlotKey`] of the chain position it belongs to, so a position can be
/// resolved to its state without knowing the state root.
///
/// Implementations are expected to provide persistent and thread-safe access.
pub trait StateStore: Debug + Send + Sync {
    /// Stores `state` under `state_root` and binds `key` to it.
    ///
    /// # Returns
    /// * `Ok(())` if the snapshot was stored, or was already stored identically.
    /// * `Err(StorageError::ConflictError)` if `key` is already bound to a different state root.
    fn put_state(
        &self,
        key: BlockSlotKey,
        state_root: Root,
        state: &BeaconState,
    ) -> Result<(), StorageError>;

    /// Loads the snapshot stored under `state_root`.
    ///
    /// # Returns
    /// * `Ok(BeaconState)` if the snapshot exists.
    /// * `Err(StorageError::EntryNotFound)` otherwise.
    fn get_state(&self, state_root: Root) -> Result<BeaconState, StorageError>;

    /// Resolves the state root bound to a chain position.
    fn state_root_at(&self, key: BlockSlotKey) -> Result<Root, StorageError>;

    /// Returns `true` if a snapshot is stored under `state_root`.
    fn contains_state(&self, state_root: Root) -> Result<bool, StorageError>;
}
