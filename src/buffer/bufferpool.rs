use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use super::frame::Frame;
use super::replacer::{LruKReplacer, Replacer};
use super::{FrameId, PageFormatter, TxnId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{self, BlockId, FileManager};

/// Where the frame for a missed block comes from.
enum Slot {
    /// A frame that has never been assigned to any block.
    Free(FrameId),
    /// A resident frame picked by the replacer.
    Victim(FrameId),
}

/// The buffer pool maps blocks to a fixed set of frames, keeps the pin
/// count of every frame and picks a victim frame with the replacer once
/// every frame has been handed out at least once.
///
/// The buffer pool itself is not synchronized, see [`BufferPoolManager`].
struct BufferPool {
    fm: Arc<dyn FileManager>,
    /// array of buffer pool frames. use the array index as
    /// FrameId, i.e., the FrameId is in range: [0, pool_size).
    frames: Vec<Arc<Frame>>,
    /// page table for keeping track of resident blocks.
    page_table: HashMap<BlockId, FrameId>,
    /// number of frames that have never been assigned a block. frames are
    /// handed out from the top of the array down and never come back.
    available: usize,
    /// Replacer to find a victim frame once no frame is available.
    replacer: Box<dyn Replacer>,
}

impl BufferPool {
    fn new(fm: Arc<dyn FileManager>, pool_size: usize, replacer_k: usize) -> Self {
        let block_size = fm.block_size();
        let frames = (0..pool_size).map(|i| Arc::new(Frame::new(i, block_size))).collect();
        let replacer = Box::new(LruKReplacer::new(replacer_k));
        BufferPool { fm, frames, page_table: HashMap::new(), available: pool_size, replacer }
    }

    /// Pin the frame holding the given block, return None if the block is
    /// not resident and no frame can be obtained.
    ///
    /// On a hit, the access is recorded and the pin count is incremented.
    /// On a miss, a never used frame is taken if any is left, otherwise a
    /// victim is asked from the replacer. The previous block of the frame,
    /// if any, is unlinked from the page table and the replacer, its
    /// contents written back if modified, and the requested block read in.
    fn pin(&mut self, blk: &BlockId) -> Result<Option<Arc<Frame>>> {
        if let Some(&frame_id) = self.page_table.get(blk) {
            let frame = Arc::clone(&self.frames[frame_id]);
            let mut guard = frame.write()?;
            self.replacer.record_access(blk);
            guard.pin();
            trace!("pinned {} in frame {}, pin count {}", blk, frame_id, guard.pin_count());

            drop(guard);
            return Ok(Some(frame));
        }

        let Some(slot) = self.choose_unpinned_frame() else {
            debug!("no frame available for {}", blk);
            return Ok(None);
        };
        let frame_id = match slot {
            Slot::Free(id) | Slot::Victim(id) => id,
        };
        let frame = Arc::clone(&self.frames[frame_id]);
        let mut guard = frame.write()?;
        let prev = guard.block().cloned();

        guard.assign_to_block(blk.clone(), self.fm.as_ref())?;
        if let Slot::Free(_) = slot {
            self.available -= 1;
        }
        // unlink the old block before linking the new one.
        if let Some(prev) = prev {
            debug!("evicted {} from frame {}", prev, frame_id);
            self.page_table.remove(&prev);
            self.replacer.remove(&prev);
        }
        self.page_table.insert(blk.clone(), frame_id);
        self.replacer.admit(blk.clone());
        guard.pin();
        debug!("allocated frame {} to {}", frame_id, blk);

        drop(guard);
        Ok(Some(frame))
    }

    /// Allocate a new block at the end of the file and pin a never used
    /// frame to it, return None if every frame has been used before.
    ///
    /// The new block is not registered in the page table nor in the
    /// replacer, pinning it later by id is treated as a miss.
    fn pin_new(&mut self, file_name: &str, fmtr: &dyn PageFormatter) -> Result<Option<Arc<Frame>>> {
        if self.available == 0 {
            debug!("no free frame for a new block of {}", file_name);
            return Ok(None);
        }
        let frame_id = self.available - 1;
        let frame = Arc::clone(&self.frames[frame_id]);
        let mut guard = frame.write()?;
        let blk = guard.assign_to_new(file_name, fmtr, self.fm.as_ref())?;
        self.available -= 1;
        guard.pin();
        debug!("allocated frame {} to new {}", frame_id, blk);

        drop(guard);
        Ok(Some(frame))
    }

    /// Decrement the pin count of the frame. Once it drops to zero the
    /// block of the frame becomes an eviction candidate. Unpinning never
    /// makes the frame available again.
    ///
    /// Return whether the pin count dropped to zero.
    fn unpin(&mut self, frame: &Frame) -> Result<bool> {
        let frame_id = frame.id();
        let owned = self.frames.get(frame_id).is_some_and(|f| std::ptr::eq(f.as_ref(), frame));
        if !owned {
            return Err(Error::Value(format!("frame {} does not belong to the pool", frame_id)));
        }
        let mut guard = frame.write()?;
        guard.unpin()?;
        if guard.is_pinned() {
            return Ok(false);
        }
        if let Some(blk) = guard.block() {
            self.replacer.set_evictable(blk.clone());
        }
        Ok(true)
    }

    /// Write back every frame modified by the given transaction.
    fn flush_all(&mut self, txn: TxnId) -> Result<()> {
        for frame in &self.frames {
            let mut guard = frame.write()?;
            if guard.is_modified_by(txn) {
                guard.flush(self.fm.as_ref())?;
            }
        }
        Ok(())
    }

    /// Pick the frame for a missed block: a never used frame while any is
    /// left, otherwise the frame of the block picked by the replacer.
    ///
    /// The replacer may pick a block whose frame has been pinned again
    /// after it became a candidate, the pin count is not checked here.
    fn choose_unpinned_frame(&self) -> Option<Slot> {
        if self.available > 0 {
            return Some(Slot::Free(self.available - 1));
        }
        let blk = self.replacer.victim()?;
        let frame_id = self.page_table.get(&blk)?;
        debug!("chose victim {} in frame {}", blk, frame_id);
        Some(Slot::Victim(*frame_id))
    }
}

/// Buffer pool manager wraps the buffer pool with a mutex for concurrent
/// access, every operation is serialized by that single latch.
///
/// Frames returned by the manager carry their own RwLock for the page
/// contents. Frame guards must be dropped before calling back into the
/// manager, the manager locks frames while holding its latch.
pub struct BufferPoolManager {
    /// hold the actual buffer pool protected by a mutex latch.
    inner: Mutex<BufferPool>,
    /// notified whenever a pin count drops to zero.
    unpinned: Condvar,
    /// how long the timed operations wait for a frame.
    max_wait: Duration,
}

impl BufferPoolManager {
    pub fn new(fm: Arc<dyn FileManager>, pool_size: usize, replacer_k: usize) -> Self {
        info!("buffer pool with {} frames, lru-{}", pool_size, replacer_k);
        let inner = BufferPool::new(fm, pool_size, replacer_k);
        BufferPoolManager {
            inner: Mutex::new(inner),
            unpinned: Condvar::new(),
            max_wait: Duration::from_millis(Config::DEFAULT_MAX_WAIT_MS),
        }
    }

    /// Create a buffer pool manager together with its file manager.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let fm = storage::new_file_manager(cfg.storage_type, &cfg.data_dir, cfg.block_size)?;
        let bpm = BufferPoolManager::new(Arc::from(fm), cfg.pool_size, cfg.replacer_k);
        Ok(bpm.with_max_wait(Duration::from_millis(cfg.max_wait_ms)))
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Pin a frame to the given block, return None right away if the
    /// block is not resident and no frame can be obtained.
    pub fn pin(&self, blk: &BlockId) -> Result<Option<Arc<Frame>>> {
        let mut inner = self.inner.lock()?;
        inner.pin(blk)
    }

    /// Allocate a new block in the file, formatted by `fmtr`, and pin a
    /// frame to it. Return None right away if no never used frame is left.
    pub fn pin_new(&self, file_name: &str, fmtr: &dyn PageFormatter) -> Result<Option<Arc<Frame>>> {
        let mut inner = self.inner.lock()?;
        inner.pin_new(file_name, fmtr)
    }

    /// Unpin the frame. Unpinning a frame whose pin count is already zero
    /// is an error and leaves the pin count untouched.
    pub fn unpin(&self, frame: &Frame) -> Result<()> {
        let mut inner = self.inner.lock()?;
        if inner.unpin(frame)? {
            self.unpinned.notify_all();
        }
        Ok(())
    }

    /// Flush the frames modified by the given transaction.
    pub fn flush_all(&self, txn: TxnId) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all(txn)
    }

    /// Number of frames that have never been assigned a block. This is
    /// not the number of frames that can be pinned right now.
    pub fn available(&self) -> Result<usize> {
        let inner = self.inner.lock()?;
        Ok(inner.available)
    }

    /// Like [`pin`](Self::pin), but waits for frames to be unpinned and
    /// fails with [`Error::BufferAbort`] once `max_wait` has elapsed.
    pub fn pin_timeout(&self, blk: &BlockId) -> Result<Arc<Frame>> {
        self.wait_for(|pool| pool.pin(blk))
    }

    /// Like [`pin_new`](Self::pin_new), but waits for frames to be unpinned
    /// and fails with [`Error::BufferAbort`] once `max_wait` has elapsed.
    pub fn pin_new_timeout(&self, file_name: &str, fmtr: &dyn PageFormatter) -> Result<Arc<Frame>> {
        self.wait_for(|pool| pool.pin_new(file_name, fmtr))
    }

    /// Frame currently holding the block, if the block is resident.
    pub fn resident_frame(&self, blk: &BlockId) -> Result<Option<FrameId>> {
        let inner = self.inner.lock()?;
        Ok(inner.page_table.get(blk).copied())
    }

    /// Length of the access history of a resident block.
    pub fn history_len(&self, blk: &BlockId) -> Result<Option<usize>> {
        let inner = self.inner.lock()?;
        Ok(inner.replacer.history_len(blk))
    }

    fn wait_for<F>(&self, mut op: F) -> Result<Arc<Frame>>
    where
        F: FnMut(&mut BufferPool) -> Result<Option<Arc<Frame>>>,
    {
        let start = Instant::now();
        let mut inner = self.inner.lock()?;
        loop {
            if let Some(frame) = op(&mut *inner)? {
                return Ok(frame);
            }
            let elapsed = start.elapsed();
            if elapsed >= self.max_wait {
                warn!("gave up waiting for a frame after {:?}", elapsed);
                return Err(Error::BufferAbort);
            }
            let (guard, _) = self.unpinned.wait_timeout(inner, self.max_wait - elapsed)?;
            inner = guard;
        }
    }
}
