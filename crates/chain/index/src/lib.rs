//! Fork-aware hot/cold chain index.
//!
//! Chain history is split into two regions:
//! - the [`HotChain`]: a tree of recent, not-yet-finalized entries rooted at the
//!   latest finalized entry (the anchor), where forks may coexist;
//! - the [`ColdChain`]: the linear, append-only sequence of finalized entries.
//!
//! The [`HotColdChain`] router composes both behind the shared [`Chain`]
//! contract, so callers can resolve entries by state root, block root or slot,
//! check ancestry and iterate the full range without knowing which region
//! holds the answer. Finalization flows from the hot region into the cold region
//! through an injected [`FinalizationSink`]; hot entries are only pruned after
//! the sink accepted them.

mod error;
pub use error::{ChainError, ColdChainError, HotChainError, Region, SinkError};

mod context;
pub use context::ExecutionContext;

mod metrics;
pub use metrics::Metrics;

mod entry;
pub use entry::{ChainEntry, EntryRef, EntrySummary, HotEntry};

mod traits;
pub use traits::{Ancestry, Chain, ChainIter};

mod hot;
pub use hot::{FinalizationSink, HotChain, HotChainIter};

mod cold;
pub use cold::{ColdChain, ColdChainIter, ColdEntry};

mod iter;
pub use iter::FullChainIter;

mod router;
pub use router::HotColdChain;

#[cfg(test)]
pub(crate) mod test_utils;
