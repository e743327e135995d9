//! Router composing the hot and cold regions.

use crate::{
    Ancestry, Chain, ChainEntry, ChainError, ChainIter, ColdChain, EntryRef, FullChainIter,
    HotChain, HotChainError, HotEntry, Region, SinkError,
};
use hotcold_primitives::{BlockSlotKey, ChainSpec, Checkpoint, Root, Slot};
use hotcold_storage::StateStore;
use std::sync::Arc;
use tracing::{error, info, trace};

/// The whole chain: a [`HotChain`] of unfinalized entries on top of a
/// [`ColdChain`] of finalized ones.
///
/// Lookups try the hot region first and fall back to the cold region. Entries
/// finalized in the hot region are ingested by the cold region before they are
/// pruned.
#[derive(Debug)]
pub struct HotColdChain {
    spec: ChainSpec,
    hot: HotChain,
    cold: Arc<ColdChain>,
}

impl HotColdChain {
    /// Builds the chain around the latest finalized entry.
    ///
    /// The anchor is ingested by the cold region and roots the hot region, so
    /// the cold range ends right where the hot range starts.
    pub fn new(
        anchor: HotEntry,
        spec: ChainSpec,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ChainError> {
        spec.validate()?;

        let cold = Arc::new(ColdChain::new(anchor.slot(), spec, store));
        cold.on_finalized_entry(&anchor)?;

        let sink = {
            let cold = Arc::clone(&cold);
            move |entry: &HotEntry| -> Result<(), SinkError> {
                cold.on_finalized_entry(entry).map_err(Into::into)
            }
        };
        let hot = HotChain::new(anchor, sink, spec);

        info!(target: "hot_cold_chain", anchor = %hot.anchor()?, "Chain index ready");
        Ok(Self { spec, hot, cold })
    }

    /// The unfinalized region.
    pub const fn hot(&self) -> &HotChain {
        &self.hot
    }

    /// The finalized region.
    pub fn cold(&self) -> &ColdChain {
        &self.cold
    }

    /// Finalizes the entry at `key` in the hot region.
    ///
    /// Positions before the anchor are checked against the cold region instead:
    /// a position disagreeing with finalized history fails with
    /// [`HotChainError::ConflictsWithFinalized`].
    pub fn finalize(&self, key: BlockSlotKey) -> Result<usize, ChainError> {
        self.check_finalized_history(key)?;
        Ok(self.hot.finalize(key)?)
    }

    /// Finalizes the checkpoint in the hot region, checking checkpoints before
    /// the anchor against the cold region.
    pub fn finalize_checkpoint(&self, checkpoint: Checkpoint) -> Result<usize, ChainError> {
        let key =
            BlockSlotKey::new(self.spec.epoch_start_slot(checkpoint.epoch), checkpoint.root);
        self.check_finalized_history(key)?;
        Ok(self.hot.finalize_checkpoint(checkpoint)?)
    }

    fn check_finalized_history(&self, key: BlockSlotKey) -> Result<(), ChainError> {
        if key.slot >= self.hot.anchor()?.slot {
            return Ok(());
        }
        let finalized = match self.cold.by_slot(key.slot) {
            // Before the cold range there is no history to check against.
            Err(ChainError::UnknownSlot(_)) => return Ok(()),
            entry => entry?.key(),
        };
        if finalized != key {
            error!(target: "hot_cold_chain", %key, %finalized, "Finalization target conflicts with finalized history");
            return Err(HotChainError::ConflictsWithFinalized { key, finalized }.into());
        }
        Ok(())
    }

    /// Whether the cold region holds `root` and `of_root`.
    fn placement(&self, root: Root, of_root: Root) -> Result<(bool, bool), ChainError> {
        Ok((self.cold.contains_block(root)?, self.cold.contains_block(of_root)?))
    }

    fn resolve_ancestry(&self, placement: (bool, bool), root: Root, of_root: Root) -> Ancestry {
        match placement {
            // Finalized history is linear and every ancestor of a finalized
            // block was finalized before it.
            (_, true) => match self.cold.is_ancestor(root, of_root) {
                Ancestry::Unknown if self.is_known(root) => Ancestry::NotAncestor,
                ancestry => ancestry,
            },
            // Every finalized block precedes or equals the anchor.
            (true, false) => match self.hot.extends_anchor(of_root) {
                Ok(true) => Ancestry::Ancestor,
                _ => Ancestry::Unknown,
            },
            (false, false) => self.hot.is_ancestor(root, of_root),
        }
    }

    fn is_known(&self, root: Root) -> bool {
        matches!(self.hot.contains_block(root), Ok(true)) ||
            matches!(self.cold.contains_block(root), Ok(true))
    }

    /// Serves a lookup from the hot region, falling back to the cold region.
    fn lookup<F>(&self, query: F) -> Result<EntryRef, ChainError>
    where
        F: Fn(&dyn Chain) -> Result<EntryRef, ChainError>,
    {
        let hot = match query(&self.hot) {
            Ok(entry) => return Ok(entry),
            Err(err) => err,
        };
        query(self.cold.as_ref()).map_err(|cold| {
            trace!(target: "hot_cold_chain", %hot, %cold, "Lookup missed both regions");
            ChainError::NotFound { hot: Box::new(hot), cold: Box::new(cold) }
        })
    }
}

impl Chain for HotColdChain {
    fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    fn by_state_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        self.lookup(|chain| chain.by_state_root(root))
    }

    fn by_block_root(&self, root: Root) -> Result<EntryRef, ChainError> {
        self.lookup(|chain| chain.by_block_root(root))
    }

    fn by_block_slot(&self, key: BlockSlotKey) -> Result<EntryRef, ChainError> {
        self.lookup(|chain| chain.by_block_slot(key))
    }

    fn closest(&self, root: Root, slot: Slot) -> Result<EntryRef, ChainError> {
        self.lookup(|chain| chain.closest(root, slot))
    }

    fn is_ancestor(&self, root: Root, of_root: Root) -> Ancestry {
        if root == of_root {
            return Ancestry::NotAncestor;
        }

        // A finalization racing this query moves blocks into the cold region.
        // Blocks never leave it, so re-resolving on a changed placement ends.
        let Ok(mut placement) = self.placement(root, of_root) else { return Ancestry::Unknown };
        loop {
            let ancestry = self.resolve_ancestry(placement, root, of_root);
            if ancestry.is_ancestor() {
                return ancestry;
            }
            match self.placement(root, of_root) {
                Ok(current) if current != placement => placement = current,
                Ok(_) => return ancestry,
                Err(_) => return Ancestry::Unknown,
            }
        }
    }

    fn by_slot(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        self.lookup(|chain| chain.by_slot(slot))
    }

    fn iter(&self) -> Result<Box<dyn ChainIter + '_>, ChainError> {
        // Hot first: a finalization in between can only make the ranges
        // overlap, never leave a gap.
        let hot = self
            .hot
            .iter()
            .map_err(|err| ChainError::Iter { region: Region::Hot, source: Box::new(err) })?;
        let cold = self
            .cold
            .iter()
            .map_err(|err| ChainError::Iter { region: Region::Cold, source: Box::new(err) })?;
        Ok(Box::new(FullChainIter::new(cold, hot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{BlockFactory, spec};
    use hotcold_primitives::ChainSpec;
    use hotcold_storage::MemoryStateStore;

    fn router() -> (BlockFactory, HotColdChain) {
        let (factory, anchor) = BlockFactory::new(spec(), 100);
        let chain =
            HotColdChain::new(anchor, spec(), Arc::new(MemoryStateStore::new())).expect("build");
        (factory, chain)
    }

    #[test]
    fn test_new_ingests_anchor_into_cold() {
        let (_, chain) = router();

        assert_eq!(chain.cold().len(), 1);
        assert!(chain.hot().is_empty());
        let iter = chain.iter().expect("iter");
        assert_eq!((iter.start(), iter.end()), (100, 101));
    }

    #[test]
    fn test_new_rejects_invalid_spec() {
        let (_, anchor) = BlockFactory::new(spec(), 100);
        let invalid = ChainSpec { slots_per_epoch: 0, ..spec() };

        let err = HotColdChain::new(anchor, invalid, Arc::new(MemoryStateStore::new())).unwrap_err();

        assert!(matches!(err, ChainError::Config(_)));
    }

    #[test]
    fn test_lookup_miss_reports_both_regions() {
        let (_, chain) = router();
        let unknown = Root::repeat_byte(0x55);

        let err = chain.by_block_root(unknown).unwrap_err();

        let ChainError::NotFound { hot, cold } = err else { panic!("unexpected error: {err}") };
        assert!(matches!(*hot, ChainError::UnknownBlockRoot(root) if root == unknown));
        assert!(matches!(*cold, ChainError::UnknownBlockRoot(root) if root == unknown));
    }

    #[test]
    fn test_hot_entries_served_before_cold() {
        let (mut factory, chain) = router();
        let anchor = chain.hot().anchor().expect("anchor");
        let a = chain.hot().add_block(&factory.child(anchor.root, 101, 1)).expect("a");
        chain.hot().set_head(a.block_root()).expect("head");

        assert_eq!(chain.by_slot(101).expect("hot slot").summary(), a.summary());
        assert_eq!(chain.by_slot(100).expect("cold slot").block_root(), anchor.root);
        assert_eq!(chain.by_block_root(anchor.root).expect("anchor").slot(), 100);
    }

    #[test]
    fn test_finalized_root_is_ancestor_of_hot_descendants() {
        let (mut factory, chain) = router();
        let anchor = chain.hot().anchor().expect("anchor");
        let a = chain.hot().add_block(&factory.child(anchor.root, 101, 1)).expect("a");
        let b = chain.hot().add_block(&factory.child(a.block_root(), 102, 2)).expect("b");
        let fork = chain.hot().add_block(&factory.child(anchor.root, 102, 3)).expect("fork");

        chain.finalize(a.key()).expect("finalize");

        assert_eq!(chain.is_ancestor(anchor.root, b.block_root()), Ancestry::Ancestor);
        assert_eq!(chain.is_ancestor(a.block_root(), b.block_root()), Ancestry::Ancestor);
        assert_eq!(chain.is_ancestor(anchor.root, a.block_root()), Ancestry::Ancestor);
        assert_eq!(chain.is_ancestor(b.block_root(), a.block_root()), Ancestry::NotAncestor);
        assert_eq!(chain.is_ancestor(anchor.root, fork.block_root()), Ancestry::Unknown);
    }

    #[test]
    fn test_finalize_checks_positions_before_anchor() {
        let (mut factory, chain) = router();
        let anchor = chain.hot().anchor().expect("anchor");
        let a = chain.hot().add_block(&factory.child(anchor.root, 101, 1)).expect("a");
        let b = chain.hot().add_block(&factory.child(a.block_root(), 104, 2)).expect("b");
        let c = chain.hot().add_block(&factory.child(b.block_root(), 105, 3)).expect("c");
        chain.finalize(c.key()).expect("finalize");

        assert_eq!(chain.finalize(a.key()).expect("finalized history"), 0);
        assert_eq!(chain.finalize(BlockSlotKey::new(100, anchor.root)).expect("anchor"), 0);

        let conflict = BlockSlotKey::new(101, Root::repeat_byte(0x77));
        let err = chain.finalize(conflict).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Hot(HotChainError::ConflictsWithFinalized { key, finalized })
                if key == conflict && finalized == a.key()
        ));

        let epoch = spec().epoch_at_slot(104);
        assert_eq!(spec().epoch_start_slot(epoch), 104);
        let checkpoint = Checkpoint { epoch, root: b.block_root() };
        assert_eq!(chain.finalize_checkpoint(checkpoint).expect("finalized checkpoint"), 0);
        let checkpoint = Checkpoint { epoch, root: Root::repeat_byte(0x77) };
        assert!(matches!(
            chain.finalize_checkpoint(checkpoint),
            Err(ChainError::Hot(HotChainError::ConflictsWithFinalized { .. }))
        ));
        assert_eq!(chain.cold().len(), 6);
    }
}
