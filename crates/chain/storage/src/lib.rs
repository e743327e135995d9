//! State snapshot storage for the hot/cold chain index.
//!
//! The cold region persists the post-state of every finalized entry through a
//! [`StateStore`]. The persisted key-value database behind it is a collaborator
//! of the chain index; this crate defines the contract and ships the in-memory
//! [`MemoryStateStore`] used by tests and ephemeral nodes.

mod error;
pub use error::StorageError;

mod traits;
pub use traits::StateStore;

mod memory;
pub use memory::MemoryStateStore;
