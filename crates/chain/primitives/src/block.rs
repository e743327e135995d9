//! Minimal block containers.
//!
//! Only the header-level fields the chain index reasons about are modeled. The
//! block body is represented by its root.

use crate::{Root, Slot, ValidatorIndex, hash::sha256};
use serde::{Deserialize, Serialize};

/// Header of a beacon block, as tracked in the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    /// Slot the block was proposed in.
    pub slot: Slot,
    /// Index of the proposer.
    pub proposer_index: ValidatorIndex,
    /// Root of the parent block.
    pub parent_root: Root,
    /// Root of the post-block state. Zero while the header is the latest header
    /// of a state that has not processed the next slot yet.
    pub state_root: Root,
    /// Root of the block body.
    pub body_root: Root,
}

impl BeaconBlockHeader {
    /// Commitment to the header fields.
    pub fn root(&self) -> Root {
        sha256(&[
            &self.slot.to_le_bytes(),
            &self.proposer_index.to_le_bytes(),
            self.parent_root.as_slice(),
            self.state_root.as_slice(),
            self.body_root.as_slice(),
        ])
    }
}

/// A beacon block reduced to its header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconBlock {
    /// Slot the block was proposed in.
    pub slot: Slot,
    /// Index of the proposer.
    pub proposer_index: ValidatorIndex,
    /// Root of the parent block.
    pub parent_root: Root,
    /// Root of the post-block state.
    pub state_root: Root,
    /// Root of the block body.
    pub body_root: Root,
}

impl BeaconBlock {
    /// Returns the header of this block.
    pub const fn header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            state_root: self.state_root,
            body_root: self.body_root,
        }
    }

    /// Returns the block root, which is the root of its header.
    pub fn root(&self) -> Root {
        self.header().root()
    }
}
