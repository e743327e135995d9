//! Arena of unfinalized entries rooted at the anchor.

use crate::{Ancestry, ChainEntry, ChainError, HotChainError, HotEntry};
use hotcold_primitives::{BeaconBlock, BlockSlotKey, ChainSpec, Root, Slot};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;

#[derive(Debug)]
struct Node {
    entry: Arc<HotEntry>,
    /// Entry at the previous slot of the same branch. `None` for the anchor.
    parent: Option<BlockSlotKey>,
}

/// Entries of the hot region, indexed by position.
///
/// Every slot between the anchor and a block is materialized, so each node links
/// to the node exactly one slot before it and empty slots of a block form a run
/// of keys `(slot, block_root)`. The run of a parent also covers the slot of each
/// child block: that entry is the child's pre-state before block processing.
#[derive(Debug)]
pub(crate) struct HotTree {
    spec: ChainSpec,
    anchor: BlockSlotKey,
    head: BlockSlotKey,
    nodes: BTreeMap<BlockSlotKey, Node>,
    /// Block root to the position of the block, or of the anchor.
    blocks: HashMap<Root, BlockSlotKey>,
    states: HashMap<Root, BlockSlotKey>,
}

impl HotTree {
    pub(crate) fn new(anchor: Arc<HotEntry>, spec: ChainSpec) -> Self {
        let key = anchor.key();
        let mut tree = Self {
            spec,
            anchor: key,
            head: key,
            nodes: BTreeMap::new(),
            blocks: HashMap::new(),
            states: HashMap::new(),
        };
        tree.blocks.insert(key.root, key);
        tree.states.insert(anchor.state_root(), key);
        tree.nodes.insert(key, Node { entry: anchor, parent: None });
        tree
    }

    pub(crate) const fn anchor(&self) -> BlockSlotKey {
        self.anchor
    }

    pub(crate) const fn head(&self) -> BlockSlotKey {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns any entry of the tree, the anchor included.
    pub(crate) fn node_entry(&self, key: &BlockSlotKey) -> Result<&Arc<HotEntry>, HotChainError> {
        self.nodes.get(key).map(|node| &node.entry).ok_or(HotChainError::UnknownEntry(*key))
    }

    const fn is_unfinalized(&self, key: &BlockSlotKey) -> bool {
        key.slot > self.anchor.slot
    }

    /// Returns the unfinalized entry at `key`.
    pub(crate) fn entry(&self, key: &BlockSlotKey) -> Option<&Arc<HotEntry>> {
        if !self.is_unfinalized(key) {
            return None;
        }
        self.nodes.get(key).map(|node| &node.entry)
    }

    /// Returns the unfinalized block entry of `root`.
    pub(crate) fn block(&self, root: &Root) -> Option<&Arc<HotEntry>> {
        self.blocks.get(root).and_then(|key| self.entry(key))
    }

    /// Position of the block `root`, the anchor included.
    pub(crate) fn block_key(&self, root: &Root) -> Option<BlockSlotKey> {
        self.blocks.get(root).copied()
    }

    pub(crate) fn by_state_root(&self, root: &Root) -> Option<&Arc<HotEntry>> {
        self.states.get(root).and_then(|key| self.entry(key))
    }

    /// Returns the entry at `slot` on the branch of the head.
    pub(crate) fn canonical(&self, slot: Slot) -> Option<&Arc<HotEntry>> {
        if slot <= self.anchor.slot || slot > self.head.slot {
            return None;
        }
        let mut cursor = self.nodes.get(&self.head);
        while let Some(node) = cursor {
            if node.entry.slot() == slot {
                return Some(&node.entry);
            }
            cursor = node.parent.and_then(|parent| self.nodes.get(&parent));
        }
        None
    }

    /// Unfinalized entries of the head branch, in increasing slot order.
    pub(crate) fn canonical_branch(&self) -> Vec<Arc<HotEntry>> {
        let mut branch = Vec::with_capacity((self.head.slot - self.anchor.slot) as usize);
        let mut cursor = self.head;
        while cursor != self.anchor {
            let Some(node) = self.nodes.get(&cursor) else { break };
            branch.push(Arc::clone(&node.entry));
            let Some(parent) = node.parent else { break };
            cursor = parent;
        }
        branch.reverse();
        branch
    }

    /// Latest unfinalized entry carrying `root` at or before `slot`.
    pub(crate) fn closest(&self, root: Root, slot: Slot) -> Result<&Arc<HotEntry>, ChainError> {
        let start = *self.blocks.get(&root).ok_or(ChainError::UnknownBlockRoot(root))?;
        if start.slot > slot {
            return Err(ChainError::NoCandidate { root, slot });
        }

        let mut best = start;
        while best.slot < slot {
            let next = BlockSlotKey::new(best.slot + 1, root);
            if !self.nodes.contains_key(&next) {
                break;
            }
            best = next;
        }
        // Only the anchor qualifies; the cold region serves it.
        self.entry(&best).ok_or(ChainError::UnknownBlockRoot(root))
    }

    /// Ancestry between two blocks of the tree, the anchor included.
    pub(crate) fn is_ancestor(&self, root: Root, of_root: Root) -> Ancestry {
        if root == of_root {
            return Ancestry::NotAncestor;
        }
        let (Some(root_key), Some(of_key)) = (self.blocks.get(&root), self.blocks.get(&of_root))
        else {
            return Ancestry::Unknown;
        };
        if root_key.slot >= of_key.slot {
            return Ancestry::NotAncestor;
        }

        let mut cursor = self.nodes.get(of_key).and_then(|node| node.parent);
        while let Some(key) = cursor {
            if key == *root_key {
                return Ancestry::Ancestor;
            }
            if key.slot <= root_key.slot {
                break;
            }
            cursor = self.nodes.get(&key).and_then(|node| node.parent);
        }
        Ancestry::NotAncestor
    }

    /// Applies `block` on top of its parent, materializing skipped slots.
    pub(crate) fn insert_block(
        &mut self,
        block: &BeaconBlock,
    ) -> Result<Arc<HotEntry>, HotChainError> {
        if block.slot <= self.anchor.slot {
            return Err(HotChainError::NotAfterAnchor {
                slot: block.slot,
                anchor_slot: self.anchor.slot,
            });
        }
        let root = block.root();
        if let Some(existing) = self.block(&root) {
            return Ok(Arc::clone(existing));
        }

        let parent = *self.blocks.get(&block.parent_root).ok_or(HotChainError::UnknownParent {
            slot: block.slot,
            parent_root: block.parent_root,
        })?;
        if block.slot <= parent.slot {
            return Err(HotChainError::SlotNotAfterParent {
                slot: block.slot,
                parent_slot: parent.slot,
            });
        }

        // The empty entry at the block slot holds the state between slot and
        // block processing; the block itself links to the slot before.
        let tip = self.extend_empty(parent, block.slot - 1)?;
        let pre_block = self.extend_empty(tip, block.slot)?;
        let mut state = self.node_entry(&pre_block)?.beacon_state().clone();
        state.state_transition(&self.spec, block)?;

        let entry = Arc::new(HotEntry::from_state(state, self.spec));
        self.insert(Arc::clone(&entry), tip);
        debug!(target: "hot_chain", slot = block.slot, %root, "Inserted block");
        Ok(entry)
    }

    /// Materializes the empty slots following `from` up to `to_slot` and
    /// returns the key of the last one.
    pub(crate) fn extend_empty(
        &mut self,
        from: BlockSlotKey,
        to_slot: Slot,
    ) -> Result<BlockSlotKey, HotChainError> {
        let mut tip = from;
        while tip.slot < to_slot {
            let next = BlockSlotKey::new(tip.slot + 1, tip.root);
            if !self.nodes.contains_key(&next) {
                let mut state = self.node_entry(&tip)?.beacon_state().clone();
                state.process_slots(&self.spec, next.slot)?;
                self.insert(Arc::new(HotEntry::from_state(state, self.spec)), tip);
            }
            tip = next;
        }
        Ok(tip)
    }

    fn insert(&mut self, entry: Arc<HotEntry>, parent: BlockSlotKey) {
        let key = entry.key();
        self.states.insert(entry.state_root(), key);
        if !entry.is_empty() {
            self.blocks.insert(key.root, key);
        }
        self.nodes.insert(key, Node { entry, parent: Some(parent) });
    }

    /// Points the head at the block `root`.
    pub(crate) fn set_head(&mut self, root: Root) -> Result<(), HotChainError> {
        self.head = *self.blocks.get(&root).ok_or(HotChainError::UnknownBlock(root))?;
        Ok(())
    }

    /// Entries from the anchor (exclusive) to `target` (inclusive), in
    /// increasing slot order.
    pub(crate) fn path_to(&self, target: BlockSlotKey) -> Result<Vec<Arc<HotEntry>>, HotChainError> {
        if !self.nodes.contains_key(&target) {
            return Err(HotChainError::UnknownEntry(target));
        }
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(key) = cursor {
            if key == self.anchor {
                path.reverse();
                return Ok(path);
            }
            let node = self.nodes.get(&key).ok_or(HotChainError::UnknownEntry(key))?;
            path.push(Arc::clone(&node.entry));
            cursor = node.parent;
        }
        Err(HotChainError::NotDescendant { key: target, anchor: self.anchor })
    }

    /// Makes `anchor` the root of the tree and drops every entry that does not
    /// descend from it.
    ///
    /// Returns the dropped entries that were never finalized.
    pub(crate) fn reanchor(&mut self, anchor: BlockSlotKey) -> Vec<Arc<HotEntry>> {
        let mut finalized = HashSet::new();
        let mut cursor = Some(anchor);
        while let Some(key) = cursor {
            finalized.insert(key);
            cursor = self.nodes.get(&key).and_then(|node| node.parent);
        }

        let mut keep = HashSet::from([anchor]);
        let mut removed = Vec::new();
        for (key, node) in &self.nodes {
            let descends = key.slot > anchor.slot &&
                node.parent.is_some_and(|parent| keep.contains(&parent));
            if descends {
                keep.insert(*key);
            } else if *key != anchor {
                removed.push(*key);
            }
        }

        let mut pruned = Vec::new();
        for key in removed {
            let Some(node) = self.nodes.remove(&key) else { continue };
            self.states.remove(&node.entry.state_root());
            if self.blocks.get(&key.root) == Some(&key) {
                self.blocks.remove(&key.root);
            }
            if !finalized.contains(&key) {
                pruned.push(node.entry);
            }
        }

        if let Some(node) = self.nodes.get_mut(&anchor) {
            node.parent = None;
        }
        self.blocks.insert(anchor.root, anchor);
        self.anchor = anchor;
        if !self.nodes.contains_key(&self.head) {
            self.head = anchor;
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{BlockFactory, spec};

    fn tree() -> (BlockFactory, HotTree) {
        let (factory, anchor) = BlockFactory::new(spec(), 100);
        (factory, HotTree::new(Arc::new(anchor), spec()))
    }

    #[test]
    fn test_insert_materializes_skipped_slots() {
        let (mut factory, mut tree) = tree();
        let anchor = tree.anchor();
        let a = factory.child(anchor.root, 101, 1);
        let b = factory.child(a.root(), 104, 2);

        tree.insert_block(&a).expect("insert a");
        let b_entry = tree.insert_block(&b).expect("insert b");

        // anchor, pre-state of a, a, 102, 103, pre-state of b, b
        assert_eq!(tree.len(), 7);
        let empty = tree.entry(&BlockSlotKey::new(103, a.root())).expect("empty slot");
        assert!(empty.is_empty());
        assert!(tree.entry(&BlockSlotKey::new(102, a.root())).is_some());

        let pre_state = tree.entry(&BlockSlotKey::new(104, a.root())).expect("pre-state of b");
        assert!(pre_state.is_empty());
        assert_eq!(pre_state.slot(), b_entry.slot());
        assert_ne!(pre_state.state_root(), b_entry.state_root());
        assert!(tree.is_ancestor(a.root(), b.root()).is_ancestor());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let (mut factory, mut tree) = tree();
        let a = factory.child(tree.anchor().root, 101, 1);

        let first = tree.insert_block(&a).expect("insert");
        let second = tree.insert_block(&a).expect("insert again");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_insert_rejects_unknown_parent() {
        let (mut factory, mut tree) = tree();
        let a = factory.child(tree.anchor().root, 101, 1);
        let orphan = factory.child(a.root(), 102, 2);

        let err = tree.insert_block(&orphan).unwrap_err();

        assert!(matches!(err, HotChainError::UnknownParent { slot: 102, .. }));
    }

    #[test]
    fn test_closest_walks_empty_run() {
        let (mut factory, mut tree) = tree();
        let a = factory.child(tree.anchor().root, 101, 1);
        let b = factory.child(a.root(), 104, 2);
        tree.insert_block(&a).expect("insert a");
        tree.insert_block(&b).expect("insert b");

        assert_eq!(tree.closest(a.root(), 102).expect("closest").slot(), 102);
        assert_eq!(tree.closest(a.root(), 110).expect("closest").slot(), 104);
        assert!(matches!(
            tree.closest(b.root(), 103),
            Err(ChainError::NoCandidate { slot: 103, .. })
        ));
    }

    #[test]
    fn test_reanchor_prunes_forks() {
        let (mut factory, mut tree) = tree();
        let anchor = tree.anchor();
        let a = factory.child(anchor.root, 101, 1);
        let fork = factory.child(anchor.root, 102, 9);
        let b = factory.child(a.root(), 103, 2);
        for block in [&a, &fork, &b] {
            tree.insert_block(block).expect("insert");
        }
        tree.set_head(fork.root()).expect("head");

        let a_key = BlockSlotKey::new(101, a.root());
        let pruned = tree.reanchor(a_key);

        assert_eq!(tree.anchor(), a_key);
        assert_eq!(tree.head(), a_key);
        assert!(pruned.iter().any(|entry| entry.block_root() == fork.root()));
        assert!(pruned.iter().all(|entry| entry.slot() > 100));
        assert!(tree.block(&fork.root()).is_none());
        assert!(tree.block(&b.root()).is_some());
        assert_eq!(tree.is_ancestor(a.root(), b.root()), Ancestry::Ancestor);
    }
}
