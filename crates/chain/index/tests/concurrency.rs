//! Readers racing a finalizing writer.

mod common;

use common::Harness;
use hotcold_chain::{Ancestry, Chain, ChainEntry, EntrySummary, HotColdChain};
use hotcold_primitives::{BlockSlotKey, Root, Slot};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

const READERS: usize = 4;

/// Blocks from slot 101 to 130, skipping every third slot.
fn linear_chain(harness: &mut Harness) -> Vec<EntrySummary> {
    let mut parent = harness.anchor;
    let mut blocks = Vec::new();
    for (slot, tag) in (101..=130).filter(|slot| slot % 3 != 0).zip(1u8..) {
        parent = harness.add(parent, slot, tag);
        blocks.push(harness.chain.by_block_root(parent).expect("added block").summary());
    }
    harness.chain.hot().set_head(parent).expect("head");
    blocks
}

fn check_reads(chain: &HotColdChain, anchor: Root, blocks: &[EntrySummary], head: Slot) {
    for block in blocks {
        let entry = chain.by_block_root(block.block_root).expect("block lookup");
        assert_eq!(entry.summary(), *block);
        assert_eq!(chain.is_ancestor(anchor, block.block_root), Ancestry::Ancestor);
    }
    for slot in 100..=head {
        let entry = chain.by_slot(slot).expect("slot lookup");
        assert_eq!(entry.slot(), slot);
    }
    for pair in blocks.windows(2) {
        let (parent, child) = (pair[0].block_root, pair[1].block_root);
        assert_eq!(chain.is_ancestor(parent, child), Ancestry::Ancestor);
        assert_eq!(chain.is_ancestor(child, parent), Ancestry::NotAncestor);
    }
}

#[test]
fn test_reads_stay_consistent_during_finalization() {
    let mut harness = Harness::new(100);
    let blocks = linear_chain(&mut harness);
    let head = blocks.last().expect("head").slot;
    let (chain, anchor) = (&harness.chain, harness.anchor);
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                scope.spawn(|| {
                    let mut rounds = 0usize;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        check_reads(chain, anchor, &blocks, head);
                        rounds += 1;
                        if finished {
                            break rounds;
                        }
                    }
                })
            })
            .collect();

        for block in &blocks {
            let key = BlockSlotKey::new(block.slot, block.block_root);
            chain.finalize(key).expect("finalize");
            thread::yield_now();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().expect("reader") > 0);
        }
    });

    assert_eq!(chain.cold().end().expect("cold end"), head + 1);
    assert!(chain.hot().is_empty());
}
