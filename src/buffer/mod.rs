use crate::error::Result;
use crate::storage::Page;

pub use self::bufferpool::BufferPoolManager;
pub use self::frame::{Frame, FrameData};

pub mod bufferpool;
pub mod frame;
pub mod replacer;

/// Index of a frame in the buffer pool, in range `[0, pool_size)`.
pub type FrameId = usize;

/// Identifies the transaction that modified a frame.
pub type TxnId = u64;

/// Initializes the contents of a newly allocated block before it is
/// appended to its file.
pub trait PageFormatter {
    fn format(&self, page: &mut Page) -> Result<()>;
}
