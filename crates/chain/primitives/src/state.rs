//! Minimal beacon state and the slot / block-header transitions.

use crate::{
    BeaconBlock, BeaconBlockHeader, ChainSpec, EpochsContext, Root, Slot, TransitionError,
    hash::sha256,
};
use serde::{Deserialize, Serialize};

/// The subset of protocol state the chain index needs to advance slots and
/// apply block headers.
///
/// `state_roots` and `block_roots` are ring buffers of length
/// `SLOTS_PER_HISTORICAL_ROOT`, indexed by `slot % SLOTS_PER_HISTORICAL_ROOT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconState {
    /// Current slot.
    pub slot: Slot,
    /// Header of the latest processed block.
    pub latest_block_header: BeaconBlockHeader,
    /// Recent block roots.
    pub block_roots: Vec<Root>,
    /// Recent state roots.
    pub state_roots: Vec<Root>,
    /// Randomness mix used for proposer selection.
    pub randao_mix: Root,
    /// Number of active validators.
    pub validator_count: u64,
}

impl BeaconState {
    /// Builds a genesis state at `spec.genesis_slot`.
    pub fn genesis(spec: &ChainSpec, validator_count: u64, randao_mix: Root) -> Self {
        let history = spec.slots_per_historical_root as usize;
        Self {
            slot: spec.genesis_slot,
            latest_block_header: BeaconBlockHeader {
                slot: spec.genesis_slot,
                body_root: sha256(&[]),
                ..Default::default()
            },
            block_roots: vec![Root::ZERO; history],
            state_roots: vec![Root::ZERO; history],
            randao_mix,
            validator_count,
        }
    }

    /// Commitment to the full state.
    pub fn state_root(&self) -> Root {
        let block_roots = sha256(&self.block_roots.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
        let state_roots = sha256(&self.state_roots.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
        sha256(&[
            &self.slot.to_le_bytes(),
            self.latest_block_header.root().as_slice(),
            block_roots.as_slice(),
            state_roots.as_slice(),
            self.randao_mix.as_slice(),
            &self.validator_count.to_le_bytes(),
        ])
    }

    /// Root of the latest block, filling in the header's state root if the next
    /// slot has not been processed yet.
    pub fn latest_block_root(&self) -> Root {
        let mut header = self.latest_block_header;
        if header.state_root.is_zero() {
            header.state_root = self.state_root();
        }
        header.root()
    }

    /// Returns `true` if the latest block was proposed at the current slot.
    pub const fn has_block_at_slot(&self) -> bool {
        self.latest_block_header.slot == self.slot
    }

    /// Returns the block root recorded for `slot`.
    ///
    /// Only slots strictly before the current slot and within the historical
    /// window are available.
    pub fn block_root_at_slot(&self, spec: &ChainSpec, slot: Slot) -> Result<Root, TransitionError> {
        if slot >= self.slot || self.slot > slot + spec.slots_per_historical_root {
            return Err(TransitionError::RootOutOfRange { slot, state: self.slot });
        }
        self.block_roots
            .get(spec.historical_index(slot))
            .copied()
            .ok_or(TransitionError::RootOutOfRange { slot, state: self.slot })
    }

    /// Computes the proposer context for the current epoch.
    pub fn epochs_context(&self, spec: &ChainSpec) -> Result<EpochsContext, TransitionError> {
        EpochsContext::compute(self, spec)
    }

    /// Advances the state through empty slots until it reaches `slot`.
    pub fn process_slots(&mut self, spec: &ChainSpec, slot: Slot) -> Result<(), TransitionError> {
        if slot <= self.slot {
            return Err(TransitionError::SlotNotAhead { current: self.slot, target: slot });
        }
        self.check_history(spec)?;
        while self.slot < slot {
            self.process_slot(spec);
            self.slot += 1;
        }
        Ok(())
    }

    /// Caches the roots of the current slot before moving on to the next.
    fn process_slot(&mut self, spec: &ChainSpec) {
        let previous_state_root = self.state_root();
        if self.latest_block_header.state_root.is_zero() {
            self.latest_block_header.state_root = previous_state_root;
        }
        let previous_block_root = self.latest_block_header.root();

        let index = spec.historical_index(self.slot);
        self.state_roots[index] = previous_state_root;
        self.block_roots[index] = previous_block_root;
    }

    const fn history_len_ok(&self, spec: &ChainSpec) -> bool {
        self.block_roots.len() as u64 == spec.slots_per_historical_root &&
            self.state_roots.len() as u64 == spec.slots_per_historical_root
    }

    fn check_history(&self, spec: &ChainSpec) -> Result<(), TransitionError> {
        if self.history_len_ok(spec) {
            return Ok(());
        }
        Err(TransitionError::HistoryLength {
            expected: spec.slots_per_historical_root,
            got: self.block_roots.len().min(self.state_roots.len()),
        })
    }

    /// Applies the header of `block` to a state already advanced to the block's
    /// slot.
    pub fn process_block_header(
        &mut self,
        spec: &ChainSpec,
        block: &BeaconBlock,
    ) -> Result<(), TransitionError> {
        if block.slot != self.slot {
            return Err(TransitionError::SlotMismatch { state: self.slot, block: block.slot });
        }
        if block.slot <= self.latest_block_header.slot {
            return Err(TransitionError::BlockNotNewer {
                latest: self.latest_block_header.slot,
                block: block.slot,
            });
        }
        let expected = self.epochs_context(spec)?.proposer(block.slot)?;
        if block.proposer_index != expected {
            return Err(TransitionError::ProposerMismatch { expected, got: block.proposer_index });
        }
        let parent = self.latest_block_root();
        if block.parent_root != parent {
            return Err(TransitionError::ParentRootMismatch { expected: parent, got: block.parent_root });
        }

        self.latest_block_header = BeaconBlockHeader {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_root: block.parent_root,
            state_root: Root::ZERO,
            body_root: block.body_root,
        };
        Ok(())
    }

    /// Advances to the block's slot, applies its header and checks the
    /// post-state root against the one embedded in the block.
    pub fn state_transition(
        &mut self,
        spec: &ChainSpec,
        block: &BeaconBlock,
    ) -> Result<(), TransitionError> {
        if block.slot > self.slot {
            self.process_slots(spec, block.slot)?;
        }
        self.process_block_header(spec, block)?;

        let computed = self.state_root();
        if computed != block.state_root {
            return Err(TransitionError::StateRootMismatch { block: block.state_root, computed });
        }
        Ok(())
    }

    /// Builds the block the selected proposer would publish at `slot` on top of
    /// this state, with the matching post-state root filled in.
    pub fn produce_block(
        &self,
        spec: &ChainSpec,
        slot: Slot,
        body_root: Root,
    ) -> Result<BeaconBlock, TransitionError> {
        let mut state = self.clone();
        if slot > state.slot {
            state.process_slots(spec, slot)?;
        }
        let mut block = BeaconBlock {
            slot,
            proposer_index: state.epochs_context(spec)?.proposer(slot)?,
            parent_root: state.latest_block_root(),
            state_root: Root::ZERO,
            body_root,
        };
        state.process_block_header(spec, &block)?;
        block.state_root = state.state_root();
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> (ChainSpec, BeaconState) {
        let spec = ChainSpec::minimal();
        let state = BeaconState::genesis(&spec, 8, Root::repeat_byte(0x42));
        (spec, state)
    }

    #[test]
    fn test_process_slots_records_roots() {
        let (spec, mut state) = genesis();
        let genesis_state_root = state.state_root();
        let genesis_block_root = state.latest_block_root();

        state.process_slots(&spec, 3).expect("advance");

        assert_eq!(state.slot, 3);
        assert_eq!(state.state_roots[0], genesis_state_root);
        assert_eq!(state.latest_block_header.state_root, genesis_state_root);
        assert_eq!(state.block_roots[0], genesis_block_root);
        assert_eq!(state.block_roots[2], genesis_block_root);
        assert_eq!(state.latest_block_root(), genesis_block_root);
        assert!(!state.has_block_at_slot());
    }

    #[test]
    fn test_process_slots_rejects_backwards() {
        let (spec, mut state) = genesis();
        state.process_slots(&spec, 2).expect("advance");

        let err = state.process_slots(&spec, 2).unwrap_err();
        assert_eq!(err, TransitionError::SlotNotAhead { current: 2, target: 2 });
    }

    #[test]
    fn test_process_slots_checks_history_length() {
        let (_, mut state) = genesis();
        let err = state.process_slots(&ChainSpec::mainnet(), 1).unwrap_err();
        assert!(matches!(err, TransitionError::HistoryLength { expected: 8192, .. }));
    }

    #[test]
    fn test_produced_block_applies() {
        let (spec, state) = genesis();
        let block = state.produce_block(&spec, 2, Root::repeat_byte(1)).expect("produce");

        let mut post = state.clone();
        post.state_transition(&spec, &block).expect("transition");

        assert_eq!(post.slot, 2);
        assert!(post.has_block_at_slot());
        assert_eq!(post.state_root(), block.state_root);
        assert_eq!(post.latest_block_root(), block.root());
        assert_eq!(block.parent_root, state.latest_block_root());
    }

    #[test]
    fn test_rejects_wrong_parent() {
        let (spec, state) = genesis();
        let mut block = state.produce_block(&spec, 1, Root::ZERO).expect("produce");
        block.parent_root = Root::repeat_byte(0xee);

        let mut post = state;
        let err = post.state_transition(&spec, &block).unwrap_err();
        assert!(matches!(err, TransitionError::ParentRootMismatch { .. }));
    }

    #[test]
    fn test_rejects_wrong_state_root() {
        let (spec, state) = genesis();
        let mut block = state.produce_block(&spec, 1, Root::ZERO).expect("produce");
        block.state_root = Root::repeat_byte(0xaa);

        let mut post = state;
        let err = post.state_transition(&spec, &block).unwrap_err();
        assert!(matches!(err, TransitionError::StateRootMismatch { .. }));
    }

    #[test]
    fn test_block_root_at_slot_window() {
        let (spec, mut state) = genesis();
        let genesis_block_root = state.latest_block_root();
        state.process_slots(&spec, 4).expect("advance");

        assert_eq!(state.block_root_at_slot(&spec, 1), Ok(genesis_block_root));
        assert!(state.block_root_at_slot(&spec, 4).is_err());
    }
}
