//! Finalization hand-off out of the hot region.

use crate::{HotEntry, SinkError};

/// Receives entries leaving the hot region.
///
/// [`FinalizationSink::on_finalized`] is invoked synchronously, exactly once per
/// newly finalized entry, in increasing slot order and before the entry may be
/// pruned. A failure stops finalization at the rejected entry; it stays in the
/// hot region and is offered again by the next finalization.
///
/// Both callbacks run while the hot chain is locked for writing. A sink must not
/// call back into the [`HotChain`](crate::HotChain) or the router owning it, or
/// it deadlocks.
pub trait FinalizationSink: Send + Sync {
    /// Accepts a newly finalized entry.
    fn on_finalized(&self, entry: &HotEntry) -> Result<(), SinkError>;

    /// Observes an entry pruned because it does not build on the finalized
    /// chain.
    fn on_pruned(&self, _entry: &HotEntry) {}
}

impl<F> FinalizationSink for F
where
    F: Fn(&HotEntry) -> Result<(), SinkError> + Send + Sync,
{
    fn on_finalized(&self, entry: &HotEntry) -> Result<(), SinkError> {
        self(entry)
    }
}
