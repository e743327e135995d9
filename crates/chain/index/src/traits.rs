//! The read contract shared by the hot region, the cold region and the router.

use crate::{ChainError, EntryRef, ExecutionContext, entry::advance};
use hotcold_primitives::{BlockSlotKey, ChainSpec, Root, Slot};
use std::fmt::Debug;

/// Outcome of an ancestry query.
///
/// `Unknown` means the answer cannot be determined locally. It is never a
/// confirmed "not an ancestor".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    /// One of the roots is not known.
    Unknown,
    /// The first root is an ancestor of the second.
    Ancestor,
    /// Both roots are known and the first is not an ancestor of the second.
    NotAncestor,
}

impl Ancestry {
    /// Returns `true` if ancestry could not be determined.
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns `true` if ancestry was confirmed.
    pub const fn is_ancestor(&self) -> bool {
        matches!(self, Self::Ancestor)
    }

    /// Splits the outcome into `(unknown, is_ancestor)`.
    pub const fn into_parts(self) -> (bool, bool) {
        (self.is_unknown(), self.is_ancestor())
    }
}

/// Read access to a region of the chain.
pub trait Chain: Debug + Send + Sync {
    /// Consensus configuration used to advance entries.
    fn spec(&self) -> &ChainSpec;

    /// Returns the entry whose state has the given root.
    fn by_state_root(&self, root: Root) -> Result<EntryRef, ChainError>;

    /// Returns the entry of the block with the given root.
    fn by_block_root(&self, root: Root) -> Result<EntryRef, ChainError>;

    /// Returns the entry at `key.slot` carrying `key.root`, which is an empty
    /// entry when the block was proposed earlier.
    fn by_block_slot(&self, key: BlockSlotKey) -> Result<EntryRef, ChainError>;

    /// Returns the latest entry at or before `slot` that carries block `root`.
    ///
    /// Blocks built on top of `root` are never returned; the block itself is
    /// the fallback when no later empty slot qualifies.
    fn closest(&self, root: Root, slot: Slot) -> Result<EntryRef, ChainError>;

    /// Returns the entry at `slot` on top of block `root`, advancing through
    /// empty slots past the closest known entry.
    ///
    /// Every transition first checks `ctx`. Moving backwards from a block past
    /// `slot` fails with [`ChainError::TargetBeforeBlock`].
    fn towards(
        &self,
        ctx: &ExecutionContext,
        root: Root,
        slot: Slot,
    ) -> Result<EntryRef, ChainError> {
        let block = self.by_block_root(root)?;
        if block.slot() > slot {
            return Err(ChainError::TargetBeforeBlock {
                root,
                block_slot: block.slot(),
                target: slot,
            });
        }
        let closest = self.closest(root, slot)?;
        advance(ctx, self.spec(), closest, slot)
    }

    /// Checks whether block `root` is an ancestor of block `of_root`.
    ///
    /// A root is never its own ancestor.
    fn is_ancestor(&self, root: Root, of_root: Root) -> Ancestry;

    /// Returns the canonical entry at `slot`.
    fn by_slot(&self, slot: Slot) -> Result<EntryRef, ChainError>;

    /// Returns an iterator over the slot range of this region.
    fn iter(&self) -> Result<Box<dyn ChainIter + '_>, ChainError>;
}

/// A bounded cursor over the entries of a slot range.
pub trait ChainIter: Debug + Send {
    /// First slot of the range, inclusive.
    fn start(&self) -> Slot;

    /// Last slot of the range, exclusive.
    fn end(&self) -> Slot;

    /// Returns the entry at `slot`, or [`ChainError::OutOfRange`] outside of
    /// `[start, end)`.
    fn entry(&self, slot: Slot) -> Result<EntryRef, ChainError>;

    /// Number of slots covered.
    fn len(&self) -> u64 {
        self.end().saturating_sub(self.start())
    }

    /// Returns `true` if the range covers no slot.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fails with [`ChainError::OutOfRange`] if `slot` is outside `[start, end)`.
pub(crate) fn check_range(slot: Slot, start: Slot, end: Slot) -> Result<(), ChainError> {
    if slot < start || slot >= end {
        return Err(ChainError::OutOfRange { slot, start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unknown(Ancestry::Unknown, (true, false))]
    #[case::ancestor(Ancestry::Ancestor, (false, true))]
    #[case::not_ancestor(Ancestry::NotAncestor, (false, false))]
    fn test_ancestry_parts(#[case] ancestry: Ancestry, #[case] parts: (bool, bool)) {
        assert_eq!(ancestry.into_parts(), parts);
    }

    #[rstest]
    #[case(10, true)]
    #[case(14, true)]
    #[case(9, false)]
    #[case(15, false)]
    fn test_check_range(#[case] slot: Slot, #[case] ok: bool) {
        assert_eq!(check_range(slot, 10, 15).is_ok(), ok);
    }
}
