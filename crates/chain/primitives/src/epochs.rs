//! Proposer context derived from a state.

use crate::{
    BeaconState, ChainSpec, Epoch, Slot, TransitionError, ValidatorIndex, hash::sha256,
};

/// Per-epoch context derived from a state: the epoch and the proposer of each of
/// its slots.
///
/// Computing it requires only the state, so chain entries build it lazily and
/// cache it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochsContext {
    epoch: Epoch,
    start_slot: Slot,
    proposers: Vec<ValidatorIndex>,
}

impl EpochsContext {
    /// Computes the context for the epoch of `state`.
    pub fn compute(state: &BeaconState, spec: &ChainSpec) -> Result<Self, TransitionError> {
        if state.validator_count == 0 {
            return Err(TransitionError::NoValidators);
        }
        let epoch = spec.epoch_at_slot(state.slot);
        let start_slot = spec.epoch_start_slot(epoch);
        let proposers = (start_slot..start_slot + spec.slots_per_epoch)
            .map(|slot| compute_proposer(state, slot))
            .collect();
        Ok(Self { epoch, start_slot, proposers })
    }

    /// Epoch covered by this context.
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Proposers of the epoch, indexed by slot offset within the epoch.
    pub fn proposers(&self) -> &[ValidatorIndex] {
        &self.proposers
    }

    /// Returns the proposer selected for `slot`.
    pub fn proposer(&self, slot: Slot) -> Result<ValidatorIndex, TransitionError> {
        slot.checked_sub(self.start_slot)
            .and_then(|offset| self.proposers.get(offset as usize))
            .copied()
            .ok_or(TransitionError::SlotOutsideEpoch { slot, epoch: self.epoch })
    }
}

fn compute_proposer(state: &BeaconState, slot: Slot) -> ValidatorIndex {
    let seed = sha256(&[state.randao_mix.as_slice(), &slot.to_le_bytes()]);
    let mut word = [0u8; 8];
    word.copy_from_slice(&seed[..8]);
    u64::from_le_bytes(word) % state.validator_count
}
