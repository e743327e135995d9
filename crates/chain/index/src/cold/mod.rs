//! The cold region: linear, append-only finalized history.

mod entry;
pub use entry::ColdEntry;

mod iter;
pub use iter::ColdChainIter;

use crate::{
    Ancestry, Chain, ChainEntry, ChainError, ChainIter, ColdChainError, EntryRef, EntrySummary,
    HotEntry, Metrics, Region,
};
use hotcold_primitives::{BlockSlotKey, ChainSpec, Root, Slot};
use hotcold_storage::StateStore;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard},
};
use tracing::{debug, error, info};

#[derive(Debug)]
struct ColdIndex {
    start: Slot,
    records: Vec<EntrySummary>,
    /// Block root to the first slot carrying it.
    blocks: HashMap<Root, Slot>,
    states: HashMap<Root, Slot>,
}

impl ColdIndex {
    fn end(&self) -> Slot {
        self.start + self.records.len() as u64
    }

    fn record(&self, slot: Slot) -> Option<&EntrySummary> {
        let offset = slot.checked_sub(self.start)?;
        self.records.get(offset as usize)
    }
}

/// Finalized entries, one per slot from the start slot onward.
///
/// Entry summaries are indexed in memory; states live in the [`StateStore`]
/// and are loaded lazily by [`ColdEntry`].
#[derive(Debug)]
pub struct ColdChain {
    spec: ChainSpec,
    store: Arc<dyn StateStore>,
    index: RwLock<ColdIndex>,
}

impl ColdChain {
    /// Creates an empty cold chain whose first entry will be at `start`.
    pub fn new(start: Slot, spec: ChainSpec, store: Arc<dyn StateStore>) -> Self {
        info!(target: "cold_chain", start, "Initializing cold chain");
        Self {
            spec,
            store,
            index: RwLock::new(ColdIndex {
                start,
                records: Vec::new(),
                blocks: HashMap::new(),
                states: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ColdIndex>, ChainError> {
        self.index.read().map_err(|_| ChainError::Poisoned(Region::Cold))
    }

    fn load(&self, summary: EntrySummary) -> EntryRef {
        Arc::new(ColdEntry::new(summary, self.spec, Arc::clone(&self.store)))
    }

    /// Appends a newly finalized entry and persists its state.
    ///
    /// The entry must be at the next slot and link to the previous entry:
    /// an empty entry keeps the previous block root, a block builds on it.
    pub fn on_finalized_entry(&self, entry: &HotEntry) -> Result<(), ColdChainError> {
        let mut index = self.index.write().map_err(|_| ColdChainError::Poisoned)?;

        let expected = index.end();
        if entry.slot() != expected {
            error!(target: "cold_chain", expected, got = entry.slot(), "Non-sequential finalized entry");
            return Err(ColdChainError::NonSequential { expected, got: entry.slot() });
        }
        if let Some(previous) = index.records.last() {
            let links_to = if entry.is_empty() { entry.block_root() } else { entry.parent_root() };
            if links_to != previous.block_root {
                error!(
                    target: "cold_chain",
                    slot = entry.slot(),
                    expected = %previous.block_root,
                    got = %links_to,
                    "Finalized entry does not extend the cold chain"
                );
                return Err(ColdChainError::Discontinuity {
                    slot: entry.slot(),
                    expected: previous.block_root,
                    got: links_to,
                });
            }
        }

        self.store.put_state(entry.key(), entry.state_root(), entry.beacon_state())?;

        let summary = entry.summary();
        index.blocks.entry(summary.block_root).or_insert(summary.slot);
        index.states.insert(summary.state_root, summary.slot);
        index.records.push(summary);

        Metrics::set_cold_head(summary.slot);
        debug!(target: "cold_chain", key = %summary.key(), "Ingested finalized entry");
        Ok(())
    }

    /// First slot of the cold chain.
    pub fn start(&self) -> Result<Slot, ChainError> {
        Ok(self.read()?.start)
    }

    /// Slot after the latest finalized entry.
    pub fn end(&self) -> Result<Slot, ChainError> {
        Ok(self.read()?.end())
    }

    /// Returns the latest finalized entry.
    pub fn head(&self) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let summary = *index.records.last().ok_or(ChainError::UnknownSlot(index.start))?;
        Ok(self.load(summary))
    }

    /// Number of finalized entries.
    pub fn len(&self) -> usize {
        match self.index.read() {
            Ok(index) => index.records.len(),
            Err(_) => {
                error!(target: "cold_chain", "Cold chain lock poisoned");
                0
            }
        }
    }

    /// Returns `true` if nothing was finalized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if some finalized entry carries `root`.
    pub fn contains_block(&self, root: Root) -> Result<bool, ChainError> {
        Ok(self.read()?.blocks.contains_key(&root))
    }
}

impl Chain for ColdChain {
    fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    fn by_state_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let summary = index
            .states
            .get(&root)
            .and_then(|slot| index.record(*slot))
            .ok_or(ChainError::UnknownStateRoot(root))?;
        Ok(self.load(*summary))
    }

    fn by_block_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let summary = index
            .blocks
            .get(&root)
            .and_then(|slot| index.record(*slot))
            .ok_or(ChainError::UnknownBlockRoot(root))?;
        Ok(self.load(*summary))
    }

    fn by_block_slot(&self, key: BlockSlotKey) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let summary = index
            .record(key.slot)
            .filter(|summary| summary.block_root == key.root)
            .ok_or(ChainError::UnknownBlockSlot(key))?;
        Ok(self.load(*summary))
    }

    fn closest(&self, root: Root, slot: Slot) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let first = *index.blocks.get(&root).ok_or(ChainError::UnknownBlockRoot(root))?;
        if first > slot {
            return Err(ChainError::NoCandidate { root, slot });
        }

        let mut best = first;
        while best < slot && index.record(best + 1).is_some_and(|next| next.block_root == root) {
            best += 1;
        }
        let summary = index.record(best).ok_or(ChainError::UnknownSlot(best))?;
        Ok(self.load(*summary))
    }

    fn is_ancestor(&self, root: Root, of_root: Root) -> Ancestry {
        let Ok(index) = self.index.read() else { return Ancestry::Unknown };
        match (index.blocks.get(&root), index.blocks.get(&of_root)) {
            (Some(slot), Some(of_slot)) if slot < of_slot => Ancestry::Ancestor,
            (Some(_), Some(_)) => Ancestry::NotAncestor,
            _ => Ancestry::Unknown,
        }
    }

    fn by_slot(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        let index = self.read()?;
        let summary = index.record(slot).ok_or(ChainError::UnknownSlot(slot))?;
        Ok(self.load(*summary))
    }

    fn iter(&self) -> Result<Box<dyn ChainIter + '_>, ChainError> {
        let index = self.read()?;
        Ok(Box::new(ColdChainIter::new(self, index.start, index.end())))
    }
}
