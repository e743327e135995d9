//! Errors raised by slot and block-header transitions.

use crate::{Epoch, Root, Slot, ValidatorIndex};
use thiserror::Error;

/// An error raised while advancing a [`BeaconState`](crate::BeaconState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Slot processing was asked to go backwards or stand still.
    #[error("cannot process slots from {current} to {target}: target must be ahead")]
    SlotNotAhead {
        /// Slot of the state.
        current: Slot,
        /// Requested slot.
        target: Slot,
    },

    /// The block does not belong to the slot of the pre-state.
    #[error("block slot {block} does not match state slot {state}")]
    SlotMismatch {
        /// Slot of the state.
        state: Slot,
        /// Slot of the block.
        block: Slot,
    },

    /// The block is not newer than the latest processed block header.
    #[error("block slot {block} is not newer than latest header slot {latest}")]
    BlockNotNewer {
        /// Slot of the latest block header.
        latest: Slot,
        /// Slot of the block.
        block: Slot,
    },

    /// The block was not proposed by the expected proposer.
    #[error("expected proposer {expected}, block has {got}")]
    ProposerMismatch {
        /// Proposer selected for the slot.
        expected: ValidatorIndex,
        /// Proposer named in the block.
        got: ValidatorIndex,
    },

    /// The block does not build on the latest block of the state.
    #[error("expected parent root {expected}, block has {got}")]
    ParentRootMismatch {
        /// Latest block root of the state.
        expected: Root,
        /// Parent root named in the block.
        got: Root,
    },

    /// The post-state does not match the state root embedded in the block.
    #[error("block state root {block} does not match computed post-state root {computed}")]
    StateRootMismatch {
        /// State root embedded in the block.
        block: Root,
        /// Root of the computed post-state.
        computed: Root,
    },

    /// The historical root buffers are not sized for the configured history length.
    #[error("historical roots length {got} does not match SLOTS_PER_HISTORICAL_ROOT {expected}")]
    HistoryLength {
        /// Configured buffer length.
        expected: u64,
        /// Actual buffer length.
        got: usize,
    },

    /// Proposer shuffling requires at least one validator.
    #[error("state has no validators")]
    NoValidators,

    /// The slot is not part of the epoch covered by the context.
    #[error("slot {slot} is outside of epoch {epoch}")]
    SlotOutsideEpoch {
        /// Requested slot.
        slot: Slot,
        /// Epoch of the context.
        epoch: Epoch,
    },

    /// The requested historical root is no longer (or not yet) in the ring buffer.
    #[error("block root at slot {slot} is not available from state at slot {state}")]
    RootOutOfRange {
        /// Requested slot.
        slot: Slot,
        /// Slot of the state.
        state: Slot,
    },
}
