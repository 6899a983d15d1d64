//! Translation cache (component D): content-addressed store of [`Block`]s
//! with a hash index, a range index for invalidation, and a death queue for
//! LRU-ish retirement under memory pressure.
//!
//! The three indexes are required to stay in sync per the data-model
//! invariant in §3: every live Block is simultaneously in the hash table,
//! covered by the range index, and either in the death queue or immortal.

use std::collections::{BTreeMap, VecDeque};

use crate::block::{Block, BlockId};
use crate::checksum;

/// Default hash-bucket count; must be a power of two (see `bucket_of`).
pub const DEFAULT_HASH_BUCKETS: usize = 1024;

/// Content-addressed Block cache.
pub struct BlockStore {
    slots: Vec<Option<Block>>,
    free_list: Vec<usize>,
    /// Hash table: bucket -> head of a move-to-front singly linked chain
    /// threaded through `Block::hash_next`.
    buckets: Vec<Option<BlockId>>,
    /// Range index keyed by guest start address. A `BTreeMap` gives the same
    /// "all Blocks overlapping [a, a+n)" query a literal range tree would, at
    /// the cost of a linear scan over candidates rather than a balanced
    /// interval tree's logarithmic one.
    range_index: BTreeMap<u32, BlockId>,
    /// FIFO of non-immortal Blocks in age order, oldest first.
    death_queue: VecDeque<BlockId>,
    death_queue_byte_threshold: usize,
    death_queue_bytes: usize,
}

impl BlockStore {
    pub fn new(hash_buckets: usize, death_queue_byte_threshold: usize) -> Self {
        assert!(hash_buckets.is_power_of_two());
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            buckets: vec![None; hash_buckets],
            range_index: BTreeMap::new(),
            death_queue: VecDeque::new(),
            death_queue_byte_threshold,
            death_queue_bytes: 0,
        }
    }

    fn bucket_of(&self, guest_start: u32) -> usize {
        (guest_start as usize) & (self.buckets.len() - 1)
    }

    pub fn get(&self, id: BlockId) -> &Block {
        self.slots[id.0].as_ref().expect("dangling BlockId")
    }

    /// Like [`Self::get`], but `None` instead of panicking if `id`'s slot has
    /// since been freed (and possibly reused by a later `insert`). Used by
    /// callers holding onto a `BlockId` across a Block-destroying operation,
    /// such as the fast-JSR ring.
    pub fn try_get(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Block {
        self.slots[id.0].as_mut().expect("dangling BlockId")
    }

    /// Fast-path lookup: is the head of this guest address's bucket already
    /// the Block we want? Mirrors `code_lookup`'s inlined head check in the
    /// donor runtime.
    pub fn lookup_fast(&self, guest_start: u32) -> Option<BlockId> {
        let head = self.buckets[self.bucket_of(guest_start)]?;
        if self.get(head).guest_start_address == guest_start {
            Some(head)
        } else {
            None
        }
    }

    /// Full lookup, walking the bucket chain and promoting a hit to the
    /// chain head (move-to-front).
    pub fn lookup_slow(&mut self, guest_start: u32) -> Option<BlockId> {
        let bucket = self.bucket_of(guest_start);
        let mut prev: Option<BlockId> = None;
        let mut cur = self.buckets[bucket];
        while let Some(id) = cur {
            let next = self.get(id).hash_next;
            if self.get(id).guest_start_address == guest_start {
                if let Some(prev_id) = prev {
                    self.get_mut(prev_id).hash_next = next;
                    self.get_mut(id).hash_next = self.buckets[bucket];
                    self.buckets[bucket] = Some(id);
                }
                return Some(id);
            }
            prev = cur;
            cur = next;
        }
        None
    }

    /// Insert a freshly translated Block into all three indexes.
    pub fn insert(&mut self, block: Block) -> BlockId {
        let guest_start = block.guest_start_address;
        let len = block.guest_code_length;
        let immortal = block.immortal;

        let id = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(block);
            BlockId(idx)
        } else {
            self.slots.push(Some(block));
            BlockId(self.slots.len() - 1)
        };

        let bucket = self.bucket_of(guest_start);
        self.get_mut(id).hash_next = self.buckets[bucket];
        self.buckets[bucket] = Some(id);

        self.range_index.insert(guest_start, id);

        if !immortal {
            self.death_queue.push_back(id);
            self.death_queue_bytes += len as usize;
        }

        id
    }

    /// Blocks whose guest range overlaps `[start, start+len)`.
    pub fn overlapping(&self, start: u32, len: u32) -> Vec<BlockId> {
        // A Block can only overlap the query if its start precedes the end
        // of the query range; we still need to check the Block's own length
        // against the query's start for the lower bound.
        self.range_index
            .range(..start.saturating_add(len))
            .map(|(_, id)| *id)
            .filter(|id| self.get(*id).overlaps(start, len))
            .collect()
    }

    /// Destroy a Block unconditionally: remove from hash, range index, and
    /// death queue (if present).
    pub fn destroy(&mut self, id: BlockId) {
        let guest_start = self.get(id).guest_start_address;
        let bucket = self.bucket_of(guest_start);

        // Unlink from the hash chain.
        let mut cur = self.buckets[bucket];
        let mut prev: Option<BlockId> = None;
        while let Some(cur_id) = cur {
            let next = self.get(cur_id).hash_next;
            if cur_id == id {
                match prev {
                    Some(p) => self.get_mut(p).hash_next = next,
                    None => self.buckets[bucket] = next,
                }
                break;
            }
            prev = Some(cur_id);
            cur = next;
        }

        self.range_index.remove(&guest_start);
        self.death_queue.retain(|&qid| qid != id);

        let len = self.get(id).guest_code_length as usize;
        self.death_queue_bytes = self.death_queue_bytes.saturating_sub(len);

        self.slots[id.0] = None;
        self.free_list.push(id.0);
    }

    /// Invalidate every Block overlapping `[addr, addr+bytes)`. Without a
    /// checksum, all overlapping Blocks are destroyed unconditionally. With
    /// one, `current_bytes` is used to recompute each Block's checksum and
    /// only those that drifted are destroyed. Returns the number destroyed.
    pub fn invalidate(
        &mut self,
        addr: u32,
        bytes: u32,
        current_bytes: Option<&dyn Fn(u32, u32) -> Vec<u8>>,
    ) -> usize {
        let candidates = self.overlapping(addr, bytes);
        let mut destroyed = 0;
        for id in candidates {
            if self.get(id).immortal {
                continue;
            }
            let keep = match (self.get(id).checksum, current_bytes) {
                (Some(checksum), Some(read)) => {
                    let block = self.get(id);
                    let bytes = read(block.guest_start_address, block.guest_code_length);
                    checksum::matches(&bytes, checksum)
                }
                _ => false,
            };
            if !keep {
                self.destroy(id);
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            log::debug!("invalidate({addr:#x}, {bytes}): destroyed {destroyed} block(s)");
        }
        destroyed
    }

    /// Retire the oldest non-immortal Block if the death queue has grown
    /// past its byte threshold. Returns whether a Block was retired.
    pub fn retire_if_over_threshold(&mut self) -> bool {
        if self.death_queue_bytes <= self.death_queue_byte_threshold {
            return false;
        }
        self.retire_oldest()
    }

    pub fn retire_oldest(&mut self) -> bool {
        match self.death_queue.pop_front() {
            Some(id) => {
                log::trace!("retiring block {id:?} under death-queue pressure");
                self.destroy(id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{SynthOp, SynthWord};

    fn trivial_block(start: u32, len: u32) -> Block {
        Block::new(
            start,
            len,
            vec![SynthWord::Op(SynthOp::ExitEmulator)],
        )
    }

    #[test]
    fn insert_then_lookup_fast_hits() {
        let mut store = BlockStore::new(16, usize::MAX);
        let id = store.insert(trivial_block(0x1000, 4));
        assert_eq!(store.lookup_fast(0x1000), Some(id));
    }

    #[test]
    fn collision_chain_move_to_front() {
        let mut store = BlockStore::new(2, usize::MAX);
        // Both addresses land in the same bucket (mod 2 == 0).
        let a = store.insert(trivial_block(0x1000, 4));
        let b = store.insert(trivial_block(0x2000, 4));
        assert_eq!(store.lookup_fast(0x1000), None, "b is now at the head");
        assert_eq!(store.lookup_slow(0x1000), Some(a));
        assert_eq!(store.lookup_fast(0x1000), Some(a), "promoted to head");
        let _ = b;
    }

    #[test]
    fn invalidate_destroys_overlapping_blocks_without_checksum() {
        let mut store = BlockStore::new(16, usize::MAX);
        store.insert(trivial_block(0x1FFC, 0x14));
        let destroyed = store.invalidate(0x2000, 1, None);
        assert_eq!(destroyed, 1);
        assert!(store.lookup_fast(0x1FFC).is_none());
    }

    #[test]
    fn invalidate_with_checksum_keeps_unchanged_block() {
        let mut store = BlockStore::new(16, usize::MAX);
        let source = vec![0x20u8, 0x3C, 0x12, 0x34];
        let sum = checksum::fold(&source);
        store.insert(trivial_block(0x1000, 4).with_checksum(sum));
        let read = |_addr: u32, _len: u32| source.clone();
        let destroyed = store.invalidate(0x1000, 4, Some(&read));
        assert_eq!(destroyed, 0);
        assert!(store.lookup_fast(0x1000).is_some());
    }

    #[test]
    fn invalidate_with_checksum_destroys_changed_block() {
        let mut store = BlockStore::new(16, usize::MAX);
        let original = vec![0x20u8, 0x3C, 0x12, 0x34];
        let sum = checksum::fold(&original);
        store.insert(trivial_block(0x1000, 4).with_checksum(sum));
        let modified = vec![0x20u8, 0x3C, 0x99, 0x34];
        let read = |_addr: u32, _len: u32| modified.clone();
        let destroyed = store.invalidate(0x1000, 4, Some(&read));
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn immortal_block_survives_invalidate() {
        let mut store = BlockStore::new(16, usize::MAX);
        store.insert(trivial_block(0x1000, 4).immortal());
        let destroyed = store.invalidate(0x1000, 4, None);
        assert_eq!(destroyed, 0);
        assert!(store.lookup_fast(0x1000).is_some());
    }

    #[test]
    fn immortal_block_never_enqueued_on_death_queue() {
        let mut store = BlockStore::new(16, 0);
        store.insert(trivial_block(0x1000, 4).immortal());
        assert!(!store.retire_if_over_threshold());
    }

    #[test]
    fn retire_oldest_removes_from_all_indexes() {
        let mut store = BlockStore::new(16, 0);
        let id = store.insert(trivial_block(0x1000, 4));
        assert!(store.retire_if_over_threshold());
        assert!(store.lookup_fast(0x1000).is_none());
        assert!(!store.death_queue.contains(&id));
    }
}
