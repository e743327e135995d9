//! Scalar aliases used across the chain index.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Fixed-duration time unit in which at most one block may be proposed.
pub type Slot = u64;

/// Fixed-size group of consecutive slots.
pub type Epoch = u64;

/// Index of a validator in the registry.
pub type ValidatorIndex = u64;

/// 32-byte hash commitment of a block or a state.
pub type Root = B256;

/// A finality checkpoint: the block root at the start slot of an epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Epoch of the checkpoint.
    pub epoch: Epoch,
    /// Block root at the first slot of the epoch (or the latest block before it).
    pub root: Root,
}

impl Checkpoint {
    /// Creates a new [`Checkpoint`].
    pub const fn new(epoch: Epoch, root: Root) -> Self {
        Self { epoch, root }
    }
}
