use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lrukpool::buffer::{BufferPoolManager, PageFormatter};
use lrukpool::error::{Error, Result};
use lrukpool::storage::{BlockId, DiskFileManager, FileManager, Page};

struct Header;

impl PageFormatter for Header {
    fn format(&self, page: &mut Page) -> Result<()> {
        page.set_string(0, "header")
    }
}

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        TempDir(std::env::temp_dir().join(format!("lrukpool-{}", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn test_disk_file_manager() -> Result<()> {
    let dir = TempDir::new();
    let fm = DiskFileManager::new(&dir.0, 32)?;
    assert_eq!(0, fm.size("t1")?);

    let mut page = Page::new(32);
    page.set_i32(0, 1)?;
    assert_eq!(BlockId::new("t1", 0), fm.append("t1", &page)?);
    page.set_i32(0, 2)?;
    assert_eq!(BlockId::new("t1", 1), fm.append("t1", &page)?);
    assert_eq!(2, fm.size("t1")?);

    page.set_i32(0, 5)?;
    fm.write(&BlockId::new("t1", 0), &page)?;

    let mut out = Page::new(32);
    fm.read(&BlockId::new("t1", 0), &mut out)?;
    assert_eq!(5, out.get_i32(0)?);
    fm.read(&BlockId::new("t1", 1), &mut out)?;
    assert_eq!(2, out.get_i32(0)?);
    // past the end of file.
    fm.read(&BlockId::new("t1", 7), &mut out)?;
    assert_eq!(Page::new(32), out);

    assert!(fm.write(&BlockId::new("t1", 0), &Page::new(16)).is_err());
    Ok(())
}

#[test]
fn test_buffer_pool_on_disk() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new();
    let blk = {
        let fm = Arc::new(DiskFileManager::new(&dir.0, 64)?);
        let bpm = BufferPoolManager::new(fm, 2, 2);
        let frame = bpm.pin_new("accounts", &Header)?.ok_or(Error::BufferAbort)?;
        let blk = frame.read()?.block().cloned().ok_or(Error::BufferAbort)?;
        frame.write()?.set_i32(32, 1000, 1)?;
        bpm.unpin(&frame)?;
        bpm.flush_all(1)?;
        blk
    };

    let fm = Arc::new(DiskFileManager::new(&dir.0, 64)?);
    assert_eq!(1, fm.size("accounts")?);
    let bpm = BufferPoolManager::new(fm, 2, 2);
    let frame = bpm.pin(&blk)?.ok_or(Error::BufferAbort)?;
    let guard = frame.read()?;
    assert_eq!("header", guard.page().get_string(0)?);
    assert_eq!(1000, guard.page().get_i32(32)?);
    Ok(())
}

#[test]
fn test_out_of_range_block_leaves_pool_usable() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new();
    let fm = Arc::new(DiskFileManager::new(&dir.0, 64)?);
    let bpm = BufferPoolManager::new(fm.clone(), 2, 2);

    let huge = BlockId::new("t", u64::MAX / 2);
    assert!(matches!(bpm.pin(&huge), Err(Error::Value(_))));
    assert_eq!(None, bpm.resident_frame(&huge)?);
    assert_eq!(2, bpm.available()?);
    assert!(matches!(fm.write(&huge, &Page::new(64)), Err(Error::Value(_))));

    let frame = bpm.pin(&BlockId::new("t", 0))?.ok_or(Error::BufferAbort)?;
    assert_eq!(1, frame.id());
    assert_eq!(1, bpm.available()?);
    bpm.unpin(&frame)?;
    Ok(())
}
