//! Fixtures shared by the unit tests.

use crate::{ChainEntry, FinalizationSink, HotEntry, SinkError};
use hotcold_primitives::{BeaconBlock, BeaconState, ChainSpec, Root, Slot};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub(crate) fn spec() -> ChainSpec {
    ChainSpec::minimal()
}

/// Produces valid blocks on top of known blocks and remembers their
/// post-states.
#[derive(Debug)]
pub(crate) struct BlockFactory {
    spec: ChainSpec,
    states: HashMap<Root, BeaconState>,
}

impl BlockFactory {
    /// Creates a factory and the anchor entry: a block at `anchor_slot` on top
    /// of genesis.
    pub(crate) fn new(spec: ChainSpec, anchor_slot: Slot) -> (Self, HotEntry) {
        let mut state = BeaconState::genesis(&spec, 64, Root::repeat_byte(0x42));
        let block = state
            .produce_block(&spec, anchor_slot, Root::repeat_byte(0xaa))
            .expect("anchor block");
        state.state_transition(&spec, &block).expect("anchor transition");

        let states = HashMap::from([(block.root(), state.clone())]);
        (Self { spec, states }, HotEntry::from_state(state, spec))
    }

    pub(crate) fn state(&self, root: Root) -> BeaconState {
        self.states.get(&root).cloned().expect("known block")
    }

    /// Produces the block at `slot` on top of `parent`. `tag` tells siblings
    /// apart.
    pub(crate) fn child(&mut self, parent: Root, slot: Slot, tag: u8) -> BeaconBlock {
        let mut state = self.state(parent);
        let block = state.produce_block(&self.spec, slot, Root::repeat_byte(tag)).expect("produce");
        state.state_transition(&self.spec, &block).expect("apply");
        self.states.insert(block.root(), state);
        block
    }

    pub(crate) fn entry(&self, block: &BeaconBlock) -> Arc<HotEntry> {
        Arc::new(HotEntry::from_state(self.state(block.root()), self.spec))
    }

    /// Entry of the empty slot `slot` after block `root`.
    pub(crate) fn empty_entry(&self, root: Root, slot: Slot) -> Arc<HotEntry> {
        let mut state = self.state(root);
        state.process_slots(&self.spec, slot).expect("advance");
        Arc::new(HotEntry::from_state(state, self.spec))
    }
}

#[derive(Debug, Default)]
struct Recorded {
    finalized: Vec<Slot>,
    pruned: Vec<Root>,
    fail_at: Option<Slot>,
}

/// Sink recording what it receives, optionally rejecting one slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub(crate) fn fail_at(&self, slot: Slot) {
        self.inner.lock().expect("lock").fail_at = Some(slot);
    }

    pub(crate) fn finalized_slots(&self) -> Vec<Slot> {
        self.inner.lock().expect("lock").finalized.clone()
    }

    pub(crate) fn pruned_roots(&self) -> Vec<Root> {
        self.inner.lock().expect("lock").pruned.clone()
    }
}

impl FinalizationSink for RecordingSink {
    fn on_finalized(&self, entry: &HotEntry) -> Result<(), SinkError> {
        let mut recorded = self.inner.lock().expect("lock");
        if recorded.fail_at == Some(entry.slot()) {
            return Err(format!("rejected slot {}", entry.slot()).into());
        }
        recorded.finalized.push(entry.slot());
        Ok(())
    }

    fn on_pruned(&self, entry: &HotEntry) {
        self.inner.lock().expect("lock").pruned.push(entry.block_root());
    }
}
