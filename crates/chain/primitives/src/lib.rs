//! Consensus primitives for the hot/cold chain index.
//!
//! This crate holds the value types shared by every region of the chain index:
//! slot and root aliases, the [`BlockSlotKey`] storage key, the [`ChainSpec`]
//! consensus configuration, and the minimal protocol containers needed to
//! advance a [`BeaconState`] through empty slots and block headers.
//!
//! Operation processing (slashings, attestations, execution payloads) and epoch
//! processing are intentionally absent; they belong to the state-transition
//! collaborator, not to the chain index.

mod types;
pub use types::{Checkpoint, Epoch, Root, Slot, ValidatorIndex};

mod key;
pub use key::BlockSlotKey;

mod config;
pub use config::{ChainSpec, ConfigError};

mod hash;

mod block;
pub use block::{BeaconBlock, BeaconBlockHeader};

mod epochs;
pub use epochs::EpochsContext;

mod state;
pub use state::BeaconState;

mod error;
pub use error::TransitionError;
