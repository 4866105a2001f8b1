use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};

/// Size of the length prefix stored in front of a string.
const INT_SIZE: usize = 4;

/// The in-memory contents of one block. A page always has exactly
/// `block_size` bytes; integers are stored big-endian and strings as
/// an i32 length prefix followed by the utf-8 bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    data: Vec<u8>,
}

impl Page {
    pub fn new(block_size: usize) -> Self {
        Page { data: vec![0; block_size] }
    }

    pub fn get_i32(&self, offset: usize) -> Result<i32> {
        let bytes = self.slice(offset, INT_SIZE)?;
        let mut buf = [0u8; INT_SIZE];
        buf.copy_from_slice(bytes);
        Ok(i32::from_be_bytes(buf))
    }

    pub fn set_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        self.slice_mut(offset, INT_SIZE)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn get_string(&self, offset: usize) -> Result<String> {
        let len = usize::try_from(self.get_i32(offset)?)?;
        let bytes = self.slice(offset + INT_SIZE, len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.slice(offset, INT_SIZE + bytes.len())?;
        self.set_i32(offset, i32::try_from(bytes.len())?)?;
        self.slice_mut(offset + INT_SIZE, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Zero the whole page.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = self.check_range(offset, len)?;
        Ok(&self.data[offset..end])
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.check_range(offset, len)?;
        Ok(&mut self.data[offset..end])
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(Error::Value(format!(
                "range {}+{} out of page bounds {}",
                offset,
                len,
                self.data.len()
            ))),
        }
    }
}

impl Deref for Page {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Page {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
