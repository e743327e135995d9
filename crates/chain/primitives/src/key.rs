//! Composite (slot, root) key.

use crate::{Root, Slot};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Composite key identifying one chain position: a block root at a slot.
///
/// For empty slots the root is the root of the latest block before the slot, so
/// several consecutive keys may share the same root.
///
/// Keys order by slot first, which keeps slot-ordered maps walkable.
#[derive(
    Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display("{root}@{slot}")]
pub struct BlockSlotKey {
    /// Slot of the chain position.
    pub slot: Slot,
    /// Block root at (or before) the slot.
    pub root: Root,
}

impl BlockSlotKey {
    /// Length of the canonical byte encoding.
    pub const ENCODED_LEN: usize = 40;

    /// Creates a new [`BlockSlotKey`].
    pub const fn new(slot: Slot, root: Root) -> Self {
        Self { slot, root }
    }

    /// Canonical storage encoding: the 32-byte root followed by the slot as 8
    /// little-endian bytes.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..32].copy_from_slice(self.root.as_slice());
        out[32..].copy_from_slice(&self.slot.to_le_bytes());
        out
    }

    /// Decodes a key previously produced by [`BlockSlotKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8; Self::ENCODED_LEN]) -> Self {
        let root = Root::from_slice(&bytes[..32]);
        let mut slot = [0u8; 8];
        slot.copy_from_slice(&bytes[32..]);
        Self { slot: Slot::from_le_bytes(slot), root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_encoding_layout() {
        let root = b256!("0x0101010101010101010101010101010101010101010101010101010101010101");
        let key = BlockSlotKey::new(0x0102, root);
        let bytes = key.to_bytes();

        assert_eq!(&bytes[..32], root.as_slice());
        assert_eq!(&bytes[32..], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(BlockSlotKey::from_bytes(&bytes), key);
    }

    #[test]
    fn test_orders_by_slot_first() {
        let low = BlockSlotKey::new(1, Root::repeat_byte(0xff));
        let high = BlockSlotKey::new(2, Root::ZERO);
        assert!(low < high);
    }

    #[test]
    fn test_display() {
        let key = BlockSlotKey::new(7, Root::ZERO);
        assert_eq!(
            key.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000000@7"
        );
    }
}
