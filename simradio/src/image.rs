//! The sender's source image: a plain in-memory byte range standing in
//! for the sender's own flash partition, read through the same
//! `storage::ReadFlash` trait a real device would implement.

use storage::{Error, ReadFlash, Result};

pub struct SimImage {
    data: Vec<u8>,
}

impl SimImage {
    pub fn new(data: Vec<u8>) -> Self {
        SimImage { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl ReadFlash for SimImage {
    fn read_size(&self) -> usize {
        1
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(bytes.len()).ok_or(Error::OutOfBounds)?;
        if end > self.data.len() {
            return Err(Error::OutOfBounds);
        }
        bytes.copy_from_slice(&self.data[offset..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}
