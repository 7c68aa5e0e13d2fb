//! RAM-backed stand-ins for the image source and destination region, used
//! until a board's real flash driver is wired in. Same shape as
//! `simradio`'s `SimImage`/`SimFlash`, without the fault injection a test
//! harness needs.

use protocol::commit::{Outcome, SupervisorFlash};
use protocol::config::{PAGE, USER_BASE, USER_END};
use storage::{Error, ReadFlash, Result};

const REGION_LEN: usize = USER_END - USER_BASE;

/// A fixed image to broadcast, held in RAM instead of a second flash slot.
pub struct RamImage {
    bytes: &'static [u8],
}

impl RamImage {
    pub const fn new(bytes: &'static [u8]) -> Self {
        RamImage { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl ReadFlash for RamImage {
    fn read_size(&self) -> usize {
        1
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&mut self, offset: usize, data: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(data.len()).ok_or(Error::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(Error::OutOfBounds);
        }
        data.copy_from_slice(&self.bytes[offset..end]);
        Ok(())
    }
}

/// Destination region, held in RAM instead of NVM. `erase_page` and
/// `write` never return `Busy`; there's no controller queue to be busy on.
pub struct RamFlash {
    region: [u8; REGION_LEN],
    erased: [bool; REGION_LEN / PAGE],
}

impl RamFlash {
    pub const fn new() -> Self {
        RamFlash { region: [0xFFu8; REGION_LEN], erased: [false; REGION_LEN / PAGE] }
    }

    pub fn committed_image(&self, len: usize) -> &[u8] {
        &self.region[..len]
    }

    fn page_index(&self, abs_addr: usize) -> usize {
        (abs_addr - USER_BASE) / PAGE
    }
}

impl Default for RamFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorFlash for RamFlash {
    type Error = core::convert::Infallible;

    fn erase_page(&mut self, abs_addr: usize) -> Outcome<Self::Error> {
        let idx = self.page_index(abs_addr);
        self.region[idx * PAGE..(idx + 1) * PAGE].fill(0xFF);
        self.erased[idx] = true;
        Outcome::Done
    }

    fn write(&mut self, abs_addr: usize, src: &[u8]) -> Outcome<Self::Error> {
        let start = abs_addr - USER_BASE;
        self.region[start..start + src.len()].copy_from_slice(src);
        Outcome::Done
    }
}
