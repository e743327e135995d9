//! The hot region: unfinalized, fork-aware chain history.

mod sink;
pub use sink::FinalizationSink;

mod tree;
use tree::HotTree;

use crate::{
    Ancestry, Chain, ChainEntry, ChainError, ChainIter, EntryRef, HotChainError, HotEntry,
    Metrics, Region, traits::check_range,
};
use hotcold_primitives::{BeaconBlock, BlockSlotKey, ChainSpec, Checkpoint, Root, Slot};
use std::{
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, error, info, warn};

/// Tree of the entries built since the latest finalized entry, the anchor.
///
/// Lookups only serve entries after the anchor; the anchor itself belongs to
/// the cold region and stays here as the root the tree links to. Finalized
/// entries are handed to the [`FinalizationSink`] before they are pruned.
pub struct HotChain {
    spec: ChainSpec,
    tree: RwLock<HotTree>,
    sink: Box<dyn FinalizationSink>,
}

impl fmt::Debug for HotChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotChain")
            .field("spec", &self.spec)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

impl HotChain {
    /// Creates a hot chain rooted at `anchor`.
    pub fn new<S>(anchor: HotEntry, sink: S, spec: ChainSpec) -> Self
    where
        S: FinalizationSink + 'static,
    {
        info!(target: "hot_chain", anchor = %anchor.key(), "Initializing hot chain");
        Self { spec, tree: RwLock::new(HotTree::new(Arc::new(anchor), spec)), sink: Box::new(sink) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HotTree>, ChainError> {
        self.tree.read().map_err(|_| ChainError::Poisoned(Region::Hot))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HotTree>, HotChainError> {
        self.tree.write().map_err(|_| HotChainError::Poisoned)
    }

    /// Adds a block on top of a known parent, materializing the empty slots in
    /// between.
    ///
    /// Adding a known block returns its existing entry.
    pub fn add_block(&self, block: &BeaconBlock) -> Result<Arc<HotEntry>, HotChainError> {
        let mut tree = self.write()?;
        let entry = tree.insert_block(block).inspect_err(|err| {
            warn!(target: "hot_chain", slot = block.slot, %err, "Failed to add block");
        })?;
        Metrics::set_hot_entries(tree.len());
        Ok(entry)
    }

    /// Sets the canonical head to the block `root`.
    pub fn set_head(&self, root: Root) -> Result<(), HotChainError> {
        self.write()?.set_head(root)?;
        debug!(target: "hot_chain", %root, "Updated head");
        Ok(())
    }

    /// Returns the entry of the canonical head, the anchor if none was set.
    pub fn head(&self) -> Result<Arc<HotEntry>, HotChainError> {
        let tree = self.tree.read().map_err(|_| HotChainError::Poisoned)?;
        tree.node_entry(&tree.head()).cloned()
    }

    /// Returns the anchor, the latest finalized entry.
    pub fn finalized(&self) -> Result<Arc<HotEntry>, HotChainError> {
        let tree = self.tree.read().map_err(|_| HotChainError::Poisoned)?;
        tree.node_entry(&tree.anchor()).cloned()
    }

    /// Returns the position of the anchor.
    pub fn anchor(&self) -> Result<BlockSlotKey, HotChainError> {
        Ok(self.tree.read().map_err(|_| HotChainError::Poisoned)?.anchor())
    }

    /// Number of entries held, the anchor included.
    pub fn len(&self) -> usize {
        match self.tree.read() {
            Ok(tree) => tree.len(),
            Err(_) => {
                error!(target: "hot_chain", "Hot chain lock poisoned");
                0
            }
        }
    }

    /// Returns `true` if only the anchor is held.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Returns `true` if the unfinalized block `root` is held.
    pub fn contains_block(&self, root: Root) -> Result<bool, ChainError> {
        Ok(self.read()?.block(&root).is_some())
    }

    /// Returns `true` if block `root` is the anchor block or builds on it.
    ///
    /// Every finalized block precedes or equals the anchor, so a `true` answer
    /// makes any finalized block an ancestor of `root`.
    pub fn extends_anchor(&self, root: Root) -> Result<bool, ChainError> {
        Ok(self.read()?.block_key(&root).is_some())
    }

    /// Finalizes the entry at `key` and every entry between it and the anchor.
    ///
    /// Each newly finalized entry is handed to the sink in increasing slot
    /// order. If the sink rejects one, the anchor only advances to the entry
    /// before it and the rejection is returned. Entries not descending from the
    /// new anchor are pruned.
    ///
    /// Positions at or before the anchor are already finalized and finalize
    /// nothing, except a position at the anchor slot other than the anchor,
    /// which fails with [`HotChainError::ConflictsWithFinalized`].
    ///
    /// Returns the number of newly finalized entries.
    pub fn finalize(&self, key: BlockSlotKey) -> Result<usize, HotChainError> {
        let mut tree = self.write()?;
        if Self::is_finalized(&tree, key)? {
            return Ok(0);
        }
        self.finalize_path(&mut tree, key)
    }

    /// Finalizes the entry at the first slot of the checkpoint epoch carrying
    /// the checkpoint root, materializing empty slots up to it if needed.
    ///
    /// Checkpoints are checked against the anchor like [`HotChain::finalize`].
    pub fn finalize_checkpoint(&self, checkpoint: Checkpoint) -> Result<usize, HotChainError> {
        let key =
            BlockSlotKey::new(self.spec.epoch_start_slot(checkpoint.epoch), checkpoint.root);
        let mut tree = self.write()?;
        if Self::is_finalized(&tree, key)? {
            return Ok(0);
        }
        let block = tree
            .block_key(&checkpoint.root)
            .ok_or(HotChainError::UnknownBlock(checkpoint.root))?;
        tree.extend_empty(block, key.slot)?;
        self.finalize_path(&mut tree, key)
    }

    fn is_finalized(tree: &HotTree, key: BlockSlotKey) -> Result<bool, HotChainError> {
        let anchor = tree.anchor();
        if key.slot > anchor.slot {
            return Ok(false);
        }
        if key.slot == anchor.slot && key != anchor {
            error!(target: "hot_chain", %key, %anchor, "Finalization target conflicts with the anchor");
            return Err(HotChainError::ConflictsWithFinalized { key, finalized: anchor });
        }
        debug!(target: "hot_chain", %key, %anchor, "Finalization target already finalized");
        Ok(true)
    }

    fn finalize_path(&self, tree: &mut HotTree, key: BlockSlotKey) -> Result<usize, HotChainError> {
        let path = tree.path_to(key)?;

        for (index, entry) in path.iter().enumerate() {
            if let Err(source) = self.sink.on_finalized(entry) {
                Metrics::record_sink_failure();
                error!(target: "hot_chain", key = %entry.key(), %source, "Finalization sink rejected entry");
                if let Some(last) = index.checked_sub(1).and_then(|last| path.get(last)) {
                    Metrics::record_finalized(index);
                    self.reanchor(tree, last.key());
                }
                return Err(HotChainError::Sink { key: entry.key(), source });
            }
        }

        Metrics::record_finalized(path.len());
        self.reanchor(tree, key);
        info!(target: "hot_chain", anchor = %key, finalized = path.len(), "Finalized entries");
        Ok(path.len())
    }

    fn reanchor(&self, tree: &mut HotTree, anchor: BlockSlotKey) {
        let pruned = tree.reanchor(anchor);
        for entry in &pruned {
            debug!(target: "hot_chain", key = %entry.key(), "Pruned entry");
            self.sink.on_pruned(entry);
        }
        Metrics::record_pruned(pruned.len());
        Metrics::set_hot_entries(tree.len());
    }
}

impl Chain for HotChain {
    fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    fn by_state_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        let tree = self.read()?;
        let entry = tree.by_state_root(&root).ok_or(ChainError::UnknownStateRoot(root))?;
        Ok(Arc::clone(entry) as EntryRef)
    }

    fn by_block_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        let tree = self.read()?;
        let entry = tree.block(&root).ok_or(ChainError::UnknownBlockRoot(root))?;
        Ok(Arc::clone(entry) as EntryRef)
    }

    fn by_block_slot(&self, key: BlockSlotKey) -> Result<EntryRef, ChainError> {
        let tree = self.read()?;
        let entry = tree.entry(&key).ok_or(ChainError::UnknownBlockSlot(key))?;
        Ok(Arc::clone(entry) as EntryRef)
    }

    fn closest(&self, root: Root, slot: Slot) -> Result<EntryRef, ChainError> {
        let tree = self.read()?;
        Ok(Arc::clone(tree.closest(root, slot)?) as EntryRef)
    }

    fn is_ancestor(&self, root: Root, of_root: Root) -> Ancestry {
        self.tree.read().map_or(Ancestry::Unknown, |tree| tree.is_ancestor(root, of_root))
    }

    fn by_slot(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        let tree = self.read()?;
        let entry = tree.canonical(slot).ok_or(ChainError::UnknownSlot(slot))?;
        Ok(Arc::clone(entry) as EntryRef)
    }

    fn iter(&self) -> Result<Box<dyn ChainIter + '_>, ChainError> {
        let tree = self.read()?;
        Ok(Box::new(HotChainIter {
            start: tree.anchor().slot + 1,
            entries: tree.canonical_branch(),
        }))
    }
}

/// Snapshot of the canonical branch of the hot region, from the slot after the
/// anchor up to and including the head.
#[derive(Debug)]
pub struct HotChainIter {
    start: Slot,
    entries: Vec<Arc<HotEntry>>,
}

impl ChainIter for HotChainIter {
    fn start(&self) -> Slot {
        self.start
    }

    fn end(&self) -> Slot {
        self.start + self.entries.len() as u64
    }

    fn entry(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        check_range(slot, self.start(), self.end())?;
        let entry = self
            .entries
            .get((slot - self.start) as usize)
            .ok_or(ChainError::UnknownSlot(slot))?;
        Ok(Arc::clone(entry) as EntryRef)
    }
}
