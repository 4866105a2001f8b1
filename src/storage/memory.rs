use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use super::{BlockId, FileManager, Page};
use crate::error::{Error, Result};

/// An in-process file manager, every file is a list of blocks kept in
/// memory. Contents are lost when the manager is dropped.
#[derive(Debug)]
pub struct MemoryFileManager {
    block_size: usize,
    files: Arc<Mutex<BTreeMap<String, Vec<Vec<u8>>>>>,
}

impl MemoryFileManager {
    pub fn new(block_size: usize) -> MemoryFileManager {
        MemoryFileManager { block_size, files: Arc::new(Mutex::new(BTreeMap::new())) }
    }

    fn check_page(&self, page: &Page) -> Result<()> {
        if page.len() != self.block_size {
            return Err(Error::Value(format!(
                "page size {} does not match block size {}",
                page.len(),
                self.block_size
            )));
        }
        Ok(())
    }
}

impl FileManager for MemoryFileManager {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read(&self, blk: &BlockId, page: &mut Page) -> Result<()> {
        self.check_page(page)?;
        let idx = usize::try_from(blk.number())?;
        let files = self.files.lock()?;
        let block = files.get(blk.file_name()).and_then(|blocks| blocks.get(idx));
        match block {
            Some(data) => page.copy_from_slice(data),
            None => page.clear(),
        }
        Ok(())
    }

    fn write(&self, blk: &BlockId, page: &Page) -> Result<()> {
        self.check_page(page)?;
        let mut files = self.files.lock()?;
        let blocks = files.entry(blk.file_name().to_string()).or_default();
        let idx = usize::try_from(blk.number())?;
        if blocks.len() <= idx {
            blocks.resize(idx + 1, vec![0; self.block_size]);
        }
        blocks[idx] = page.to_vec();
        Ok(())
    }

    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId> {
        self.check_page(page)?;
        let mut files = self.files.lock()?;
        let blocks = files.entry(file_name.to_string()).or_default();
        blocks.push(page.to_vec());
        Ok(BlockId::new(file_name, blocks.len() as u64 - 1))
    }

    fn size(&self, file_name: &str) -> Result<u64> {
        let files = self.files.lock()?;
        Ok(files.get(file_name).map_or(0, |blocks| blocks.len() as u64))
    }
}
