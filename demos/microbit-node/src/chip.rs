//! Stand-in `protocol::hal` implementations for a board that hasn't grown
//! a real radio and flash driver yet.
//!
//! `Millis` is genuinely portable ARMv7-M (SysTick, present on every
//! Cortex-M part); wire it up once in `main` and both `Clock` and `Sleep`
//! come for free. `NullRadio`, `NullRng`, and `RamImage`/`RamFlash` are not:
//! they exist so this crate links and boots on hardware before a target
//! board's radio transceiver and NVM controller are plugged in. Swap them
//! for the board's own drivers implementing the same three traits; nothing
//! else in this crate needs to change.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;

use protocol::hal::{Clock, Radio, Rng, Sleep};
use radiolink::DATA_FRAME_LEN;

static MILLIS: AtomicU32 = AtomicU32::new(0);

#[exception]
fn SysTick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Configures the system tick for a 1ms period against `sysclk_hz`. Call
/// once, before constructing a `Sender`/`Receiver`.
pub fn init_millis(syst: &mut SYST, sysclk_hz: u32) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(sysclk_hz / 1000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

#[derive(Clone, Copy, Default)]
pub struct Millis;

impl Clock for Millis {
    fn now_ms(&self) -> u32 {
        MILLIS.load(Ordering::Relaxed)
    }
}

impl Sleep for Millis {
    fn sleep_ms(&mut self, ms: u32) {
        let deadline = MILLIS.load(Ordering::Relaxed).wrapping_add(ms);
        while MILLIS.load(Ordering::Relaxed) < deadline {
            cortex_m::asm::wfi();
        }
    }
}

/// A radio that hears nothing and sends nowhere. Replace with a driver for
/// the board's actual transceiver before flashing this to two boards that
/// need to talk to each other.
#[derive(Default)]
pub struct NullRadio;

impl Radio for NullRadio {
    fn send(&mut self, _frame: &[u8]) {}

    fn recv(&mut self) -> Option<heapless::Vec<u8, DATA_FRAME_LEN>> {
        None
    }

    fn disable(&mut self) {}
}

/// Resets the processor into the image starting at `reset_base`, the same
/// way a chained bootloader hands off to the application it just verified:
/// point the vector table at the new image and branch through its reset
/// vector. Never returns.
///
/// # Safety
/// `reset_base` must point at a valid, complete vector table; calling this
/// before the transfer has committed a full image will jump into garbage.
pub unsafe fn chain(reset_base: usize) -> ! {
    let mut p = cortex_m::Peripherals::steal();
    p.SCB.vtor.write(reset_base as u32);
    cortex_m::asm::bootload(reset_base as *const u32);
}

/// Jitter source backed by the cycle counter, good enough for spreading out
/// NAK timing without a true entropy source.
pub struct CycleRng;

impl Rng for CycleRng {
    fn rand(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let cycles = cortex_m::peripheral::DWT::cycle_count();
        cycles % n
    }
}
