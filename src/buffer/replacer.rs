use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::storage::BlockId;

/// Default K of the LRU-K replacement policy.
pub const DEFAULT_K: usize = 2;

/// Replacer tracks block accesses and eviction candidates so the buffer
/// pool can pick a victim once it has no never-used frame left.
///
/// A replacer is not synchronized, it's owned by the buffer pool and
/// protected by the pool latch together with the frame table.
pub trait Replacer: Send {
    /// Record a hit on a resident block at the current timestamp.
    fn record_access(&mut self, blk: &BlockId);

    /// Start a fresh access history holding only the current timestamp
    /// for a block that just became resident.
    fn admit(&mut self, blk: BlockId);

    /// Mark the block as an eviction candidate, called when the pin
    /// count of its frame drops to zero. Marking twice is a no-op.
    fn set_evictable(&mut self, blk: BlockId);

    /// Forget the block, along with its access history and candidate
    /// membership. Called when the block leaves the buffer pool.
    fn remove(&mut self, blk: &BlockId);

    /// Pick the candidate block to evict, None if no candidate exists.
    fn victim(&self) -> Option<BlockId>;

    /// Length of the access history of the block, None if not tracked.
    fn history_len(&self, blk: &BlockId) -> Option<usize>;

    /// Number of eviction candidates.
    fn size(&self) -> usize;
}

/// LruKReplacer implements an approximate LRU-k replacement policy.
///
/// Every resident block keeps a short history of access timestamps,
/// least recent in front. A hit drops the front entry only when the
/// history already holds more than k entries, so a history that has
/// seen enough hits oscillates between k and k + 1 entries.
///
/// Blocks with fewer than k accesses are preferred as victims, among
/// them the one whose last access is the oldest. If every candidate has
/// a full history, the one with the largest front timestamp is picked.
///
/// Candidates are only added, never dropped when their block is pinned
/// again, so a victim may belong to a frame that is currently pinned.
pub struct LruKReplacer {
    k: usize,
    /// access history per resident block.
    histories: HashMap<BlockId, VecDeque<u64>>,
    /// blocks whose pin count has dropped to zero at least once.
    candidates: HashSet<BlockId>,
    current_timestamp: u64,
}

impl LruKReplacer {
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "replacer k should be larger than zero");
        LruKReplacer {
            k,
            histories: HashMap::new(),
            candidates: HashSet::new(),
            current_timestamp: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        let now = self.current_timestamp;
        self.current_timestamp += 1;
        now
    }

    /// Oldest retained timestamp of a candidate with a full history,
    /// the one with the largest of those timestamps wins.
    fn full_history_victim(&self) -> Option<&BlockId> {
        let mut flagged: Option<(&BlockId, u64)> = None;
        for blk in &self.candidates {
            let Some(history) = self.histories.get(blk) else {
                continue;
            };
            let Some(&kth) = history.front() else {
                continue;
            };
            if flagged.map_or(true, |(_, max)| max < kth) {
                flagged = Some((blk, kth));
            }
        }
        flagged.map(|(blk, _)| blk)
    }

    /// Among candidates with fewer than k accesses, the one whose last
    /// access is the oldest.
    fn short_history_victim(&self) -> Option<&BlockId> {
        let mut flagged: Option<(&BlockId, u64)> = None;
        for blk in &self.candidates {
            let Some(history) = self.histories.get(blk) else {
                continue;
            };
            if history.len() >= self.k {
                continue;
            }
            let Some(&last) = history.back() else {
                continue;
            };
            if flagged.map_or(true, |(_, min)| last < min) {
                flagged = Some((blk, last));
            }
        }
        flagged.map(|(blk, _)| blk)
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&mut self, blk: &BlockId) {
        let now = self.tick();
        let k = self.k;
        if let Some(history) = self.histories.get_mut(blk) {
            if history.len() > k {
                history.pop_front();
            }
            history.push_back(now);
        }
    }

    fn admit(&mut self, blk: BlockId) {
        let now = self.tick();
        self.histories.insert(blk, VecDeque::from([now]));
    }

    fn set_evictable(&mut self, blk: BlockId) {
        self.candidates.insert(blk);
    }

    fn remove(&mut self, blk: &BlockId) {
        self.histories.remove(blk);
        self.candidates.remove(blk);
    }

    fn victim(&self) -> Option<BlockId> {
        if self.candidates.is_empty() {
            return None;
        }
        // the first pass only detects whether any candidate has a short
        // history, the tie-break among those is done by a second pass.
        let has_short_history = self
            .candidates
            .iter()
            .filter_map(|blk| self.histories.get(blk))
            .any(|history| history.len() < self.k);
        let victim = if has_short_history {
            self.short_history_victim()
        } else {
            self.full_history_victim()
        };
        victim.cloned()
    }

    fn history_len(&self, blk: &BlockId) -> Option<usize> {
        self.histories.get(blk).map(|history| history.len())
    }

    fn size(&self) -> usize {
        self.candidates.len()
    }
}
