use std::sync::Arc;

use lrukpool::buffer::BufferPoolManager;
use lrukpool::storage::{BlockId, MemoryFileManager};

macro_rules! setup {
    ($name:ident, $sz:expr) => {
        let _ = env_logger::builder().is_test(true).try_init();
        let $name = new_bpm($sz);
    };
}

mod concurrency;
mod disk;

pub fn new_bpm(pool_size: usize) -> BufferPoolManager {
    let fm = Arc::new(MemoryFileManager::new(lrukpool::storage::BLOCK_SIZE));
    BufferPoolManager::new(fm, pool_size, 2)
}

pub fn blk(n: u64) -> BlockId {
    BlockId::new("temp", n)
}
