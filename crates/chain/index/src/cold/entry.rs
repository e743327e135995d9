use crate::{ChainEntry, ChainError, EntrySummary, ExecutionContext};
use hotcold_primitives::{BeaconState, ChainSpec, EpochsContext, Root, Slot};
use hotcold_storage::StateStore;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// A finalized entry whose state is loaded from the [`StateStore`] on demand.
#[derive(Debug)]
pub struct ColdEntry {
    summary: EntrySummary,
    spec: ChainSpec,
    store: Arc<dyn StateStore>,
    state: OnceLock<Arc<BeaconState>>,
    epochs: OnceLock<Arc<EpochsContext>>,
}

impl ColdEntry {
    pub(crate) fn new(summary: EntrySummary, spec: ChainSpec, store: Arc<dyn StateStore>) -> Self {
        Self { summary, spec, store, state: OnceLock::new(), epochs: OnceLock::new() }
    }
}

impl ChainEntry for ColdEntry {
    fn slot(&self) -> Slot {
        self.summary.slot
    }

    fn block_root(&self) -> Root {
        self.summary.block_root
    }

    fn parent_root(&self) -> Root {
        self.summary.parent_root
    }

    fn is_empty(&self) -> bool {
        self.summary.is_empty
    }

    fn state_root(&self) -> Root {
        self.summary.state_root
    }

    fn epochs_context(&self, ctx: &ExecutionContext) -> Result<Arc<EpochsContext>, ChainError> {
        if let Some(epochs) = self.epochs.get() {
            return Ok(Arc::clone(epochs));
        }
        let computed = Arc::new(self.state(ctx)?.epochs_context(&self.spec)?);
        Ok(Arc::clone(self.epochs.get_or_init(|| computed)))
    }

    fn state(&self, ctx: &ExecutionContext) -> Result<Arc<BeaconState>, ChainError> {
        if let Some(state) = self.state.get() {
            return Ok(Arc::clone(state));
        }
        ctx.check()?;
        trace!(target: "cold_chain", state_root = %self.summary.state_root, "Loading state");
        let loaded = Arc::new(self.store.get_state(self.summary.state_root)?);
        Ok(Arc::clone(self.state.get_or_init(|| loaded)))
    }

    fn summary(&self) -> EntrySummary {
        self.summary
    }
}
