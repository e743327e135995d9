use crate::{Chain, ChainError, ChainIter, ColdChain, EntryRef, traits::check_range};
use hotcold_primitives::Slot;

/// Cursor over the finalized range of a [`ColdChain`], fixed at creation.
#[derive(Debug)]
pub struct ColdChainIter<'a> {
    chain: &'a ColdChain,
    start: Slot,
    end: Slot,
}

impl<'a> ColdChainIter<'a> {
    pub(crate) const fn new(chain: &'a ColdChain, start: Slot, end: Slot) -> Self {
        Self { chain, start, end }
    }
}

impl ChainIter for ColdChainIter<'_> {
    fn start(&self) -> Slot {
        self.start
    }

    fn end(&self) -> Slot {
        self.end
    }

    fn entry(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        check_range(slot, self.start, self.end)?;
        self.chain.by_slot(slot)
    }
}
