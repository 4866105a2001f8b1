use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{BlockId, FileManager, Page};
use crate::error::{Error, Result};

/// A file manager that stores every file as an OS file under `dir`,
/// block `n` lives at byte offset `n * block_size`.
pub struct DiskFileManager {
    dir: PathBuf,
    block_size: usize,
    /// opened files, keyed by file name.
    files: Mutex<HashMap<String, File>>,
}

impl DiskFileManager {
    pub fn new(dir: impl AsRef<Path>, block_size: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(DiskFileManager { dir, block_size, files: Mutex::new(HashMap::new()) })
    }

    fn with_file<T>(&self, file_name: &str, f: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
        let mut files = self.files.lock()?;
        if !files.contains_key(file_name) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(self.dir.join(file_name))?;
            files.insert(file_name.to_string(), file);
        }
        match files.get_mut(file_name) {
            Some(file) => f(file),
            None => Err(Error::Internal(format!("file {} is not open", file_name))),
        }
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

    /// Byte range `[start, end)` of the block in its file.
    fn span(&self, number: u64) -> Result<(u64, u64)> {
        let block_size = self.block_size as u64;
        number
            .checked_mul(block_size)
            .and_then(|start| Some((start, start.checked_add(block_size)?)))
            .ok_or_else(|| Error::Value(format!("block {} is out of file bounds", number)))
    }
}

impl Debug for DiskFileManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskFileManager")
            .field("dir", &self.dir)
            .field("block_size", &self.block_size)
            .finish()
    }
}

impl FileManager for DiskFileManager {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read(&self, blk: &BlockId, page: &mut Page) -> Result<()> {
        self.check_page(page)?;
        let (offset, end) = self.span(blk.number())?;
        self.with_file(blk.file_name(), |file| {
            let len = file.metadata()?.len();
            if end > len {
                page.clear();
                return Ok(());
            }
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(page)?;
            Ok(())
        })
    }

    fn write(&self, blk: &BlockId, page: &Page) -> Result<()> {
        self.check_page(page)?;
        let (offset, _) = self.span(blk.number())?;
        self.with_file(blk.file_name(), |file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(page)?;
            file.sync_data()?;
            Ok(())
        })
    }

    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId> {
        self.check_page(page)?;
        let block_size = self.block_size as u64;
        self.with_file(file_name, |file| {
            let number = file.metadata()?.len() / block_size;
            let (offset, _) = self.span(number)?;
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(page)?;
            file.sync_data()?;
            Ok(BlockId::new(file_name, number))
        })
    }

    fn size(&self, file_name: &str) -> Result<u64> {
        let block_size = self.block_size as u64;
        self.with_file(file_name, |file| Ok(file.metadata()?.len() / block_size))
    }
}
