//! Error types of the chain index.

use derive_more::Display;
use hotcold_primitives::{BlockSlotKey, ConfigError, Root, Slot, TransitionError};
use hotcold_storage::StorageError;
use thiserror::Error;

/// Error reported by a [`FinalizationSink`](crate::FinalizationSink).
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One of the two regions of the chain.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// The unfinalized, fork-aware region.
    #[display("hot")]
    Hot,
    /// The finalized, linear region.
    #[display("cold")]
    Cold,
}

/// Errors returned by the read side of the [`Chain`](crate::Chain) contract.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No entry carries the block root.
    #[error("unknown block root {0}")]
    UnknownBlockRoot(Root),

    /// No entry carries the state root.
    #[error("unknown state root {0}")]
    UnknownStateRoot(Root),

    /// No entry exists for the (slot, root) position.
    #[error("no entry at {0}")]
    UnknownBlockSlot(BlockSlotKey),

    /// No entry exists at the slot.
    #[error("no entry at slot {0}")]
    UnknownSlot(Slot),

    /// The block is known but no entry of its subtree is at or before the slot.
    #[error("no entry from block {root} up to slot {slot}")]
    NoCandidate {
        /// Block root the search started from.
        root: Root,
        /// Upper slot bound of the search.
        slot: Slot,
    },

    /// A transition towards a slot was requested from a later block.
    #[error("block {root} at slot {block_slot} is past target slot {target}")]
    TargetBeforeBlock {
        /// Block root the transition starts from.
        root: Root,
        /// Slot of that block.
        block_slot: Slot,
        /// Requested slot.
        target: Slot,
    },

    /// The slot is outside the range of an iterator.
    #[error("slot {slot} is outside of range [{start}, {end})")]
    OutOfRange {
        /// Requested slot.
        slot: Slot,
        /// First slot of the range, inclusive.
        start: Slot,
        /// Last slot of the range, exclusive.
        end: Slot,
    },

    /// Neither region could answer the query.
    #[error("could not find chain entry in hot or cold chain. Hot: {hot}, Cold: {cold}")]
    NotFound {
        /// Failure of the hot region.
        hot: Box<ChainError>,
        /// Failure of the cold region.
        cold: Box<ChainError>,
    },

    /// An iterator over one region could not be created.
    #[error("cannot iter {region} part: {source}")]
    Iter {
        /// Region that failed.
        region: Region,
        /// Underlying failure.
        #[source]
        source: Box<ChainError>,
    },

    /// The execution context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The execution context deadline passed.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    /// A lock guarding a region was poisoned.
    #[error("{0} chain lock poisoned")]
    Poisoned(Region),

    /// The consensus configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Slot processing failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The state store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The hot region failed to initialize or update.
    #[error(transparent)]
    Hot(#[from] HotChainError),

    /// The cold region failed to initialize or ingest.
    #[error(transparent)]
    Cold(#[from] ColdChainError),
}

impl ChainError {
    /// Returns `true` if the operation was interrupted by its execution context.
    ///
    /// Interrupted operations may succeed when retried with a fresh context.
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` if the error reports a missing entry.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::UnknownBlockRoot(_) |
            Self::UnknownStateRoot(_) |
            Self::UnknownBlockSlot(_) |
            Self::UnknownSlot(_) |
            Self::NoCandidate { .. } => true,
            Self::NotFound { hot, cold } => hot.is_not_found() && cold.is_not_found(),
            _ => false,
        }
    }
}

/// Errors raised while mutating the [`HotChain`](crate::HotChain).
#[derive(Debug, Error)]
pub enum HotChainError {
    /// The parent of the block is not part of the hot region.
    #[error("unknown parent {parent_root} of block at slot {slot}")]
    UnknownParent {
        /// Slot of the block.
        slot: Slot,
        /// Parent root named by the block.
        parent_root: Root,
    },

    /// The block root is not part of the hot region.
    #[error("unknown block {0}")]
    UnknownBlock(Root),

    /// The position is not part of the hot region.
    #[error("unknown entry {0}")]
    UnknownEntry(BlockSlotKey),

    /// The block is not after its parent.
    #[error("block slot {slot} is not after parent slot {parent_slot}")]
    SlotNotAfterParent {
        /// Slot of the block.
        slot: Slot,
        /// Slot of the parent block.
        parent_slot: Slot,
    },

    /// The block is at or before the finalized anchor.
    #[error("block slot {slot} is not after anchor slot {anchor_slot}")]
    NotAfterAnchor {
        /// Slot of the block.
        slot: Slot,
        /// Slot of the anchor.
        anchor_slot: Slot,
    },

    /// The finalization target does not build on the anchor.
    #[error("{key} does not descend from anchor {anchor}")]
    NotDescendant {
        /// Requested finalization target.
        key: BlockSlotKey,
        /// Current anchor.
        anchor: BlockSlotKey,
    },

    /// A finalization target disagrees with the finalized history.
    #[error("finalization target {key} conflicts with finalized {finalized}")]
    ConflictsWithFinalized {
        /// Requested finalization target.
        key: BlockSlotKey,
        /// Finalized entry at the same slot.
        finalized: BlockSlotKey,
    },

    /// Slot or block processing failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The finalization sink rejected an entry; it was not pruned.
    #[error("finalization sink rejected {key}: {source}")]
    Sink {
        /// Entry the sink rejected.
        key: BlockSlotKey,
        /// Failure reported by the sink.
        #[source]
        source: SinkError,
    },

    /// The hot region lock was poisoned.
    #[error("hot chain lock poisoned")]
    Poisoned,
}

/// Errors raised while writing to the [`ColdChain`](crate::ColdChain).
///
/// `NonSequential` and `Discontinuity` signal a broken finalization contract
/// upstream: the cold region only ever grows by exactly one linked slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColdChainError {
    /// The entry is not at the next slot (duplicate or out of order).
    #[error("expected finalized entry at slot {expected}, got slot {got}")]
    NonSequential {
        /// Next slot of the cold region.
        expected: Slot,
        /// Slot of the offered entry.
        got: Slot,
    },

    /// The entry does not link to the previous cold entry.
    #[error("entry at slot {slot} links to {got}, expected {expected}")]
    Discontinuity {
        /// Slot of the offered entry.
        slot: Slot,
        /// Block root of the previous cold entry.
        expected: Root,
        /// Root the entry links to.
        got: Root,
    },

    /// Persisting the entry state failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The cold region lock was poisoned.
    #[error("cold chain lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_exposes_both_regions() {
        let err = ChainError::NotFound {
            hot: Box::new(ChainError::UnknownSlot(5)),
            cold: Box::new(ChainError::UnknownStateRoot(Root::ZERO)),
        };
        let msg = err.to_string();
        assert!(msg.contains("Hot: no entry at slot 5"), "unexpected message: {msg}");
        assert!(msg.contains("Cold: unknown state root"), "unexpected message: {msg}");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_interrupted_kinds() {
        assert!(ChainError::Cancelled.is_interrupted());
        assert!(ChainError::DeadlineExceeded.is_interrupted());
        assert!(!ChainError::UnknownSlot(1).is_interrupted());
        assert!(!ChainError::Cancelled.is_not_found());
    }

    #[test]
    fn test_poisoned_region_display() {
        assert_eq!(ChainError::Poisoned(Region::Cold).to_string(), "cold chain lock poisoned");
    }
}
