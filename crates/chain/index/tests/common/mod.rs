//! Chain fixtures for the scenario tests.

#![allow(dead_code, unreachable_pub)]

use hotcold_chain::{ChainEntry, HotColdChain, HotEntry};
use hotcold_primitives::{BeaconBlock, BeaconState, ChainSpec, Root, Slot};
use hotcold_storage::MemoryStateStore;
use std::{collections::HashMap, sync::Arc};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A router anchored at a block, plus a producer of valid blocks.
#[derive(Debug)]
pub struct Harness {
    pub spec: ChainSpec,
    pub chain: HotColdChain,
    pub store: MemoryStateStore,
    pub anchor: Root,
    states: HashMap<Root, BeaconState>,
}

impl Harness {
    pub fn new(anchor_slot: Slot) -> Self {
        init_tracing();
        let spec = ChainSpec::minimal();
        let mut state = BeaconState::genesis(&spec, 64, Root::repeat_byte(0x42));
        let block = state
            .produce_block(&spec, anchor_slot, Root::repeat_byte(0xaa))
            .expect("anchor block");
        state.state_transition(&spec, &block).expect("anchor transition");

        let store = MemoryStateStore::new();
        let anchor = HotEntry::from_state(state.clone(), spec);
        let anchor_root = anchor.block_root();
        let chain = HotColdChain::new(anchor, spec, Arc::new(store.clone())).expect("build chain");

        Self { spec, chain, store, anchor: anchor_root, states: HashMap::from([(anchor_root, state)]) }
    }

    /// Produces the block at `slot` on top of `parent` without adding it.
    pub fn produce(&mut self, parent: Root, slot: Slot, tag: u8) -> BeaconBlock {
        let mut state = self.states.get(&parent).cloned().expect("known parent");
        let block = state.produce_block(&self.spec, slot, Root::repeat_byte(tag)).expect("produce");
        state.state_transition(&self.spec, &block).expect("apply");
        self.states.insert(block.root(), state);
        block
    }

    /// Produces and adds a block, returning its root.
    pub fn add(&mut self, parent: Root, slot: Slot, tag: u8) -> Root {
        let block = self.produce(parent, slot, tag);
        self.chain.hot().add_block(&block).expect("add block").block_root()
    }
}
