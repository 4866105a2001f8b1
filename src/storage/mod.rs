use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::disk::DiskFileManager;
pub use self::memory::MemoryFileManager;
pub use self::page::Page;

pub mod disk;
pub mod memory;
pub mod page;

/// Default size of a block(and of the page holding it) in bytes.
pub const BLOCK_SIZE: usize = 400;

/// Identifies a block by its file name and its logical block number
/// within that file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    file_name: String,
    number: u64,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, number: u64) -> Self {
        BlockId { file_name: file_name.into(), number }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

/// A block oriented file storage, the buffer pool reads blocks into
/// its frames and writes modified frames back through it.
///
/// The FileManager trait is designed as `trait object` compatible so
/// that the buffer pool can hold it as `Arc<dyn FileManager>`.
pub trait FileManager: Debug + Send + Sync {
    /// Size of every block managed by this file manager, in bytes.
    fn block_size(&self) -> usize;

    /// Reads the contents of the given block into the page. Reading a
    /// block that was never written yields a zeroed page.
    fn read(&self, blk: &BlockId, page: &mut Page) -> Result<()>;

    /// Writes the contents of the page to the given block.
    fn write(&self, blk: &BlockId, page: &Page) -> Result<()>;

    /// Appends the page as a new block at the end of the file and
    /// returns the id of that block.
    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId>;

    /// Number of blocks in the file.
    fn size(&self, file_name: &str) -> Result<u64>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Memory,
    Disk,
}

pub fn new_file_manager(
    typ: StorageType,
    data_dir: &str,
    block_size: usize,
) -> Result<Box<dyn FileManager>> {
    match typ {
        StorageType::Memory => Ok(Box::new(MemoryFileManager::new(block_size))),
        StorageType::Disk => Ok(Box::new(DiskFileManager::new(data_dir, block_size)?)),
    }
}
