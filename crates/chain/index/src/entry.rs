//! Chain entries: one (slot, block) position of the chain.

use crate::{ChainError, ExecutionContext, Metrics};
use hotcold_primitives::{BeaconState, BlockSlotKey, ChainSpec, EpochsContext, Root, Slot};
use std::{
    fmt::Debug,
    sync::{Arc, OnceLock},
};
use tracing::trace;

/// A single position of the chain.
///
/// Slots without a block carry the root of the most recent preceding block and
/// report [`ChainEntry::is_empty`]. The state and the derived epochs context may
/// be loaded lazily; loading honours the [`ExecutionContext`].
pub trait ChainEntry: Debug + Send + Sync {
    /// Slot of the entry.
    fn slot(&self) -> Slot;

    /// Root of the block at this slot, or of the latest preceding block for an
    /// empty slot.
    fn block_root(&self) -> Root;

    /// Root of the block this entry builds on. Empty entries build on the block
    /// they carry, so their parent root equals their block root.
    fn parent_root(&self) -> Root;

    /// Returns `true` if no block was proposed at this slot.
    fn is_empty(&self) -> bool;

    /// Root of the post-slot (or post-block) state.
    fn state_root(&self) -> Root;

    /// Proposer context of the entry's epoch.
    fn epochs_context(&self, ctx: &ExecutionContext) -> Result<Arc<EpochsContext>, ChainError>;

    /// Full state after this slot.
    fn state(&self, ctx: &ExecutionContext) -> Result<Arc<BeaconState>, ChainError>;

    /// Storage key of the entry.
    fn key(&self) -> BlockSlotKey {
        BlockSlotKey::new(self.slot(), self.block_root())
    }

    /// Content of the entry without its state.
    fn summary(&self) -> EntrySummary {
        EntrySummary {
            slot: self.slot(),
            block_root: self.block_root(),
            parent_root: self.parent_root(),
            state_root: self.state_root(),
            is_empty: self.is_empty(),
        }
    }
}

/// Shared handle to a chain entry served by either region.
pub type EntryRef = Arc<dyn ChainEntry>;

/// The identifying content of an entry.
///
/// Two entries describing the same chain position have equal summaries no
/// matter which region served them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntrySummary {
    /// Slot of the entry.
    pub slot: Slot,
    /// Block root carried by the entry.
    pub block_root: Root,
    /// Root of the block the entry builds on.
    pub parent_root: Root,
    /// Root of the entry state.
    pub state_root: Root,
    /// `true` if no block was proposed at the slot.
    pub is_empty: bool,
}

impl EntrySummary {
    /// Storage key of the entry.
    pub const fn key(&self) -> BlockSlotKey {
        BlockSlotKey::new(self.slot, self.block_root)
    }
}

/// An entry whose state is held in memory.
///
/// Hot entries are produced by slot and block processing and handed to the
/// finalization sink once finalized.
#[derive(Debug)]
pub struct HotEntry {
    summary: EntrySummary,
    spec: ChainSpec,
    state: Arc<BeaconState>,
    epochs: OnceLock<Arc<EpochsContext>>,
}

impl HotEntry {
    /// Builds the entry describing `state`.
    pub fn from_state(state: BeaconState, spec: ChainSpec) -> Self {
        let block_root = state.latest_block_root();
        let is_empty = !state.has_block_at_slot();
        let summary = EntrySummary {
            slot: state.slot,
            block_root,
            parent_root: if is_empty {
                block_root
            } else {
                state.latest_block_header.parent_root
            },
            state_root: state.state_root(),
            is_empty,
        };
        Self { summary, spec, state: Arc::new(state), epochs: OnceLock::new() }
    }

    /// The in-memory state of the entry.
    pub fn beacon_state(&self) -> &BeaconState {
        &self.state
    }
}

impl ChainEntry for HotEntry {
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
        ctx.check()?;
        let computed = Arc::new(self.state.epochs_context(&self.spec)?);
        Ok(Arc::clone(self.epochs.get_or_init(|| computed)))
    }

    fn state(&self, _ctx: &ExecutionContext) -> Result<Arc<BeaconState>, ChainError> {
        Ok(Arc::clone(&self.state))
    }

    fn summary(&self) -> EntrySummary {
        self.summary
    }
}

/// Advances `from` through empty slots until `to_slot`.
///
/// The context is checked before every slot transition; an interrupted advance
/// returns the interruption error, never a partially advanced entry.
pub(crate) fn advance(
    ctx: &ExecutionContext,
    spec: &ChainSpec,
    from: EntryRef,
    to_slot: Slot,
) -> Result<EntryRef, ChainError> {
    if from.slot() >= to_slot {
        return Ok(from);
    }

    let mut state = from.state(ctx)?.as_ref().clone();
    let mut transitions = 0u64;
    while state.slot < to_slot {
        ctx.check()?;
        state.process_slots(spec, state.slot + 1)?;
        transitions += 1;
    }
    trace!(target: "hot_cold_chain", from = %from.key(), to_slot, transitions, "Advanced through empty slots");
    Metrics::record_towards(transitions);

    Ok(Arc::new(HotEntry::from_state(state, *spec)))
}
