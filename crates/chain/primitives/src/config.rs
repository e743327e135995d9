//! Consensus configuration threaded through both chain regions.

use crate::{Epoch, Slot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error raised while decoding or validating a [`ChainSpec`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A constant that must be positive was zero.
    #[error("config value {0} must be greater than zero")]
    ZeroValue(&'static str),

    /// The TOML document could not be decoded.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// The JSON document could not be decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Slot and epoch arithmetic constants of the consensus protocol.
///
/// Keys follow the upper-case naming used by consensus config files, e.g.
/// `SLOTS_PER_EPOCH = 32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ChainSpec {
    /// Number of slots in an epoch.
    pub slots_per_epoch: u64,
    /// Length of the `block_roots` / `state_roots` ring buffers in the state.
    pub slots_per_historical_root: u64,
    /// Duration of a slot in seconds.
    pub seconds_per_slot: u64,
    /// Slot of the genesis state.
    #[serde(default)]
    pub genesis_slot: Slot,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainSpec {
    /// Mainnet preset.
    pub const fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            seconds_per_slot: 12,
            genesis_slot: 0,
        }
    }

    /// Minimal preset, used by tests and local devnets.
    pub const fn minimal() -> Self {
        Self { slots_per_epoch: 8, slots_per_historical_root: 64, seconds_per_slot: 6, genesis_slot: 0 }
    }

    /// Decodes a configuration from a TOML document and validates it.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let spec: Self = toml::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Decodes a configuration from a JSON document and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks that every divisor is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots_per_epoch == 0 {
            return Err(ConfigError::ZeroValue("SLOTS_PER_EPOCH"));
        }
        if self.slots_per_historical_root == 0 {
            return Err(ConfigError::ZeroValue("SLOTS_PER_HISTORICAL_ROOT"));
        }
        if self.seconds_per_slot == 0 {
            return Err(ConfigError::ZeroValue("SECONDS_PER_SLOT"));
        }
        Ok(())
    }

    /// Returns the epoch containing `slot`.
    pub const fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch
    }

    /// Returns the first slot of `epoch`.
    pub const fn epoch_start_slot(&self, epoch: Epoch) -> Slot {
        epoch * self.slots_per_epoch
    }

    /// Returns `true` if `slot` is the first slot of its epoch.
    pub const fn is_epoch_start(&self, slot: Slot) -> bool {
        slot % self.slots_per_epoch == 0
    }

    /// Position of `slot` in the historical root ring buffers.
    pub const fn historical_index(&self, slot: Slot) -> usize {
        (slot % self.slots_per_historical_root) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            SLOTS_PER_EPOCH = 8
            SLOTS_PER_HISTORICAL_ROOT = 64
            SECONDS_PER_SLOT = 6
        "#;
        let spec = ChainSpec::from_toml_str(raw).expect("valid toml spec");
        assert_eq!(spec, ChainSpec::minimal());
    }

    #[test]
    fn test_parse_json() {
        let raw = r#"{
            "SLOTS_PER_EPOCH": 32,
            "SLOTS_PER_HISTORICAL_ROOT": 8192,
            "SECONDS_PER_SLOT": 12,
            "GENESIS_SLOT": 0
        }"#;
        let spec = ChainSpec::from_json_str(raw).expect("valid json spec");
        assert_eq!(spec, ChainSpec::mainnet());
    }

    #[test]
    fn test_rejects_zero_slots_per_epoch() {
        let raw = r#"
            SLOTS_PER_EPOCH = 0
            SLOTS_PER_HISTORICAL_ROOT = 64
            SECONDS_PER_SLOT = 6
        "#;
        let err = ChainSpec::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroValue("SLOTS_PER_EPOCH")));
    }

    #[test]
    fn test_rejects_missing_field() {
        let err = ChainSpec::from_json_str(r#"{"SLOTS_PER_EPOCH": 8}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[rstest]
    #[case(0, 0, true)]
    #[case(7, 0, false)]
    #[case(8, 1, true)]
    #[case(17, 2, false)]
    fn test_epoch_arithmetic(#[case] slot: Slot, #[case] epoch: Epoch, #[case] is_start: bool) {
        let spec = ChainSpec::minimal();
        assert_eq!(spec.epoch_at_slot(slot), epoch);
        assert_eq!(spec.is_epoch_start(slot), is_start);
        assert!(spec.epoch_start_slot(epoch) <= slot);
    }
}
