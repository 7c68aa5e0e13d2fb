//! Flash commit wrapper.
//!
//! `erase` and `write` each issue a single supervisor call and retry for as
//! long as it reports BUSY, with a cooperative low-power wait between
//! attempts. Same shape as `storage::check_erase` / `check_write` validating
//! arguments for a direct `Flash` impl, except here the underlying call can
//! transiently refuse and has to be nursed through that instead of just
//! accepted or rejected once.

use crate::hal::Sleep;

/// Result of one supervisor-call attempt.
pub enum Outcome<E> {
    /// The call completed.
    Done,
    /// The controller is busy; retry after a wait.
    Busy,
    /// Anything else is fatal; the caller does not retry.
    Fatal(E),
}

/// A flash device reached through a supervisor call that can transiently
/// refuse with BUSY. This is the receiver's destination; the sender's
/// source image is read through `storage::ReadFlash` instead, since reads
/// on this hardware don't have a BUSY path to retry.
pub trait SupervisorFlash {
    type Error;

    /// Erase the page containing `abs_addr`. Must precede the first write
    /// to that page since boot.
    fn erase_page(&mut self, abs_addr: usize) -> Outcome<Self::Error>;

    /// Write `src` starting at `abs_addr` in a single supervisor request.
    fn write(&mut self, abs_addr: usize, src: &[u8]) -> Outcome<Self::Error>;
}

/// Wait between BUSY retries. Flash controllers of this class clear BUSY
/// in well under a millisecond; this just has to be short enough not to
/// visibly stall the radio loop.
const RETRY_WAIT_MS: u32 = 1;

pub fn erase<F: SupervisorFlash, S: Sleep>(
    flash: &mut F,
    sleep: &mut S,
    abs_addr: usize,
) -> Result<(), F::Error> {
    loop {
        match flash.erase_page(abs_addr) {
            Outcome::Done => return Ok(()),
            Outcome::Busy => sleep.sleep_ms(RETRY_WAIT_MS),
            Outcome::Fatal(e) => return Err(e),
        }
    }
}

pub fn write<F: SupervisorFlash, S: Sleep>(
    flash: &mut F,
    sleep: &mut S,
    abs_addr: usize,
    src: &[u8],
) -> Result<(), F::Error> {
    loop {
        match flash.write(abs_addr, src) {
            Outcome::Done => return Ok(()),
            Outcome::Busy => sleep.sleep_ms(RETRY_WAIT_MS),
            Outcome::Fatal(e) => return Err(e),
        }
    }
}
