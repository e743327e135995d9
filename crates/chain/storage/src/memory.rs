//! In-memory [`StateStore`] implementation.

use crate::{StateStore, StorageError};
use hotcold_primitives::{BeaconState, BlockSlotKey, Root};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};
use tracing::{debug, error, warn};

type KeyBytes = [u8; BlockSlotKey::ENCODED_LEN];

#[derive(Debug, Default)]
struct Tables {
    states: HashMap<Root, Arc<BeaconState>>,
    positions: BTreeMap<KeyBytes, Root>,
}

/// A [`StateStore`] holding snapshots in memory.
///
/// Chain positions are indexed by the canonical 40-byte [`BlockSlotKey`]
/// encoding, the same layout a persisted key-value backend uses. Concurrent
/// readers are allowed; writers are exclusive.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.tables.read().map(|tables| tables.states.len()).unwrap_or_default()
    }

    /// Returns `true` if no snapshot is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemoryStateStore {
    fn put_state(
        &self,
        key: BlockSlotKey,
        state_root: Root,
        state: &BeaconState,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|_| StorageError::Poisoned)?;
        let encoded = key.to_bytes();

        if let Some(existing) = tables.positions.get(&encoded) {
            if *existing != state_root {
                error!(
                    target: "state_store",
                    %key,
                    %existing,
                    %state_root,
                    "Chain position already bound to another state"
                );
                return Err(StorageError::ConflictError(format!(
                    "{key} is bound to state {existing}"
                )));
            }
        }

        tables.positions.insert(encoded, state_root);
        tables.states.entry(state_root).or_insert_with(|| Arc::new(state.clone()));
        debug!(target: "state_store", %key, %state_root, "Stored state");
        Ok(())
    }

    fn get_state(&self, state_root: Root) -> Result<BeaconState, StorageError> {
        let tables = self.tables.read().map_err(|_| StorageError::Poisoned)?;
        let state = tables.states.get(&state_root).ok_or_else(|| {
            warn!(target: "state_store", %state_root, "No state found");
            StorageError::EntryNotFound(format!("state {state_root}"))
        })?;
        Ok(state.as_ref().clone())
    }

    fn state_root_at(&self, key: BlockSlotKey) -> Result<Root, StorageError> {
        let tables = self.tables.read().map_err(|_| StorageError::Poisoned)?;
        tables
            .positions
            .get(&key.to_bytes())
            .copied()
            .ok_or_else(|| StorageError::EntryNotFound(format!("position {key}")))
    }

    fn contains_state(&self, state_root: Root) -> Result<bool, StorageError> {
        let tables = self.tables.read().map_err(|_| StorageError::Poisoned)?;
        Ok(tables.states.contains_key(&state_root))
    }
}
