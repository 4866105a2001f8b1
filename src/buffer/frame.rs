use std::ops::Deref;
use std::sync::RwLock;

use super::{FrameId, PageFormatter, TxnId};
use crate::error::{Error, Result};
use crate::storage::{BlockId, FileManager, Page};

/// The state of one buffer pool slot: the page contents, the block the
/// contents belong to (if any), the pin count and the transaction that
/// modified the contents since they were last written back.
#[derive(Debug)]
pub struct FrameData {
    page: Page,
    block: Option<BlockId>,
    pin_count: u32,
    modified_by: Option<TxnId>,
}

impl FrameData {
    fn new(block_size: usize) -> Self {
        FrameData { page: Page::new(block_size), block: None, pin_count: 0, modified_by: None }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    pub fn modified_by(&self) -> Option<TxnId> {
        self.modified_by
    }

    pub fn is_modified_by(&self, txn: TxnId) -> bool {
        self.modified_by == Some(txn)
    }

    /// Mark the contents as modified by the given transaction.
    pub fn set_modified(&mut self, txn: TxnId) {
        self.modified_by = Some(txn);
    }

    pub fn set_i32(&mut self, offset: usize, value: i32, txn: TxnId) -> Result<()> {
        self.page.set_i32(offset, value)?;
        self.set_modified(txn);
        Ok(())
    }

    pub fn set_string(&mut self, offset: usize, value: &str, txn: TxnId) -> Result<()> {
        self.page.set_string(offset, value)?;
        self.set_modified(txn);
        Ok(())
    }

    /// Write the page back to its block if it has been modified, the
    /// modification marker is cleared afterwards.
    pub(super) fn flush(&mut self, fm: &dyn FileManager) -> Result<()> {
        if self.modified_by.is_none() {
            return Ok(());
        }
        if let Some(blk) = &self.block {
            fm.write(blk, &self.page)?;
        }
        self.modified_by = None;
        Ok(())
    }

    /// Read the block into the page, flushing the previous contents
    /// first. The pin count is reset. On a failed read the frame keeps
    /// its previous block and contents.
    pub(super) fn assign_to_block(&mut self, blk: BlockId, fm: &dyn FileManager) -> Result<()> {
        self.flush(fm)?;
        let mut page = Page::new(self.page.len());
        fm.read(&blk, &mut page)?;
        self.page = page;
        self.block = Some(blk);
        self.pin_count = 0;
        Ok(())
    }

    /// Format the page, append it as a new block of the file and assign
    /// that block to the frame. The pin count is reset.
    pub(super) fn assign_to_new(
        &mut self,
        file_name: &str,
        fmtr: &dyn PageFormatter,
        fm: &dyn FileManager,
    ) -> Result<BlockId> {
        self.flush(fm)?;
        self.page.clear();
        fmtr.format(&mut self.page)?;
        let blk = fm.append(file_name, &self.page)?;
        self.block = Some(blk.clone());
        self.pin_count = 0;
        Ok(blk)
    }

    pub(super) fn pin(&mut self) {
        self.pin_count += 1;
    }

    /// Decrement the pin count, the count never goes below zero.
    pub(super) fn unpin(&mut self) -> Result<u32> {
        match self.pin_count.checked_sub(1) {
            Some(count) => {
                self.pin_count = count;
                Ok(count)
            }
            None => Err(Error::Value(format!(
                "unpin of a frame that is not pinned, block {:?}",
                self.block
            ))),
        }
    }
}

/// Frame is a buffer pool slot. Frames are allocated once when the pool
/// is created, the pool relabels them with a different block on eviction.
///
/// The frame data is guarded by a RwLock so callers can access the page
/// contents while the frame is pinned.
#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    inner: RwLock<FrameData>,
}

impl Frame {
    pub(super) fn new(id: FrameId, block_size: usize) -> Self {
        Frame { id, inner: RwLock::new(FrameData::new(block_size)) }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }
}

impl Deref for Frame {
    type Target = RwLock<FrameData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
