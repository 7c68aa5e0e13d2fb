//! A NOR-style simulated flash controller reached through the same
//! erase/write-with-BUSY shape as the real supervisor call, with the
//! ability to inject a fixed run of BUSY responses or a fatal error at a
//! given address.

use std::collections::HashMap;

use protocol::commit::{Outcome, SupervisorFlash};
use protocol::config::{PAGE, USER_BASE, USER_END};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SimFlashError {
    /// Test harness asked for a write to a page that was never erased.
    NotErased,
    /// A fault was injected for this test.
    Injected,
}

pub struct SimFlash {
    region: Vec<u8>,
    erased: Vec<bool>,
    write_busy: HashMap<usize, u32>,
    erase_busy: HashMap<usize, u32>,
    write_fatal: HashMap<usize, bool>,
    pub erase_calls: u32,
    pub write_calls: u32,
}

impl SimFlash {
    pub fn new() -> Self {
        let len = USER_END - USER_BASE;
        let pages = len / PAGE;
        SimFlash {
            region: vec![0xFFu8; len],
            erased: vec![false; pages],
            write_busy: HashMap::new(),
            erase_busy: HashMap::new(),
            write_fatal: HashMap::new(),
            erase_calls: 0,
            write_calls: 0,
        }
    }

    /// The next `count` calls to `write` at `abs_addr` report BUSY before
    /// the call that actually succeeds.
    pub fn inject_write_busy(&mut self, abs_addr: usize, count: u32) {
        self.write_busy.insert(abs_addr, count);
    }

    /// The next call to `erase_page` at `abs_addr` reports BUSY `count` times.
    pub fn inject_erase_busy(&mut self, abs_addr: usize, count: u32) {
        self.erase_busy.insert(abs_addr, count);
    }

    /// The next call to `write` at `abs_addr` fails fatally instead of succeeding.
    pub fn inject_write_fatal(&mut self, abs_addr: usize) {
        self.write_fatal.insert(abs_addr, true);
    }

    pub fn committed_page(&self, page_index: usize) -> &[u8] {
        &self.region[page_index * PAGE..(page_index + 1) * PAGE]
    }

    pub fn committed_image(&self, len: usize) -> &[u8] {
        &self.region[..len]
    }

    fn page_index(&self, abs_addr: usize) -> usize {
        (abs_addr - USER_BASE) / PAGE
    }
}

impl Default for SimFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorFlash for SimFlash {
    type Error = SimFlashError;

    fn erase_page(&mut self, abs_addr: usize) -> Outcome<Self::Error> {
        self.erase_calls += 1;
        if let Some(left) = self.erase_busy.get_mut(&abs_addr) {
            if *left > 0 {
                *left -= 1;
                return Outcome::Busy;
            }
        }
        let idx = self.page_index(abs_addr);
        let start = idx * PAGE;
        self.region[start..start + PAGE].fill(0xFF);
        self.erased[idx] = true;
        Outcome::Done
    }

    fn write(&mut self, abs_addr: usize, src: &[u8]) -> Outcome<Self::Error> {
        self.write_calls += 1;
        if self.write_fatal.remove(&abs_addr).unwrap_or(false) {
            return Outcome::Fatal(SimFlashError::Injected);
        }
        if let Some(left) = self.write_busy.get_mut(&abs_addr) {
            if *left > 0 {
                *left -= 1;
                return Outcome::Busy;
            }
        }
        let idx = self.page_index(abs_addr);
        if !self.erased[idx] {
            return Outcome::Fatal(SimFlashError::NotErased);
        }
        let start = abs_addr - USER_BASE;
        self.region[start..start + src.len()].copy_from_slice(src);
        Outcome::Done
    }
}
