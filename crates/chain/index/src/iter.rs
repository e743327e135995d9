//! Iteration across both regions.

use crate::{ChainError, ChainIter, EntryRef, traits::check_range};
use hotcold_primitives::Slot;
use tracing::warn;

/// Stitches a cold iterator and a hot iterator into one continuous range.
///
/// Slots before the end of the cold iterator are served by the cold region,
/// later slots by the hot region.
#[derive(Debug)]
pub struct FullChainIter<'a> {
    cold: Box<dyn ChainIter + 'a>,
    hot: Box<dyn ChainIter + 'a>,
}

impl<'a> FullChainIter<'a> {
    /// Composes the iterators of both regions.
    pub fn new(cold: Box<dyn ChainIter + 'a>, hot: Box<dyn ChainIter + 'a>) -> Self {
        if cold.end() < hot.start() {
            warn!(
                target: "hot_cold_chain",
                cold_end = cold.end(),
                hot_start = hot.start(),
                "Gap between cold and hot iterators"
            );
        }
        Self { cold, hot }
    }

    /// Slot where the hot region takes over.
    pub fn boundary(&self) -> Slot {
        self.cold.end()
    }

    /// Iterates the entries of the whole range in increasing slot order.
    pub fn entries(&self) -> impl Iterator<Item = Result<EntryRef, ChainError>> + '_ {
        (self.start()..self.end()).map(|slot| self.entry(slot))
    }
}

impl ChainIter for FullChainIter<'_> {
    fn start(&self) -> Slot {
        self.cold.start()
    }

    fn end(&self) -> Slot {
        self.hot.end()
    }

    fn entry(&self, slot: Slot) -> Result<EntryRef, ChainError> {
        check_range(slot, self.start(), self.end())?;
        if slot < self.cold.end() { self.cold.entry(slot) } else { self.hot.entry(slot) }
    }
}
