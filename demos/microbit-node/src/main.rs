#![no_main]
#![no_std]

extern crate panic_halt;

#[cfg(feature = "rtt")]
use defmt_rtt as _;

mod chip;
mod ram;

use cortex_m_rt::entry;

use chip::{chain, CycleRng, Millis, NullRadio};
use protocol::hal::Radio;
use protocol::receiver::Completion;
use ram::{RamFlash, RamImage};

/// Placeholder firmware image for the sender role. A real deployment
/// reads this from a second flash slot instead of linking it in as a
/// constant.
static IMAGE: [u8; 32] = [0u8; 32];

/// System clock feeding the SysTick reload calculation; board-specific,
/// hardcoded here since this crate has no chip HAL to query it from.
const SYSCLK_HZ: u32 = 64_000_000;

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();
    chip::init_millis(&mut cp.SYST, SYSCLK_HZ);

    #[cfg(feature = "node-sender")]
    {
        let image = RamImage::new(&IMAGE);
        let image_len = image.len();
        let mut sender =
            protocol::Sender::new(image, image_len, NullRadio, Millis, Millis, CycleRng);
        sender.run();
    }

    #[cfg(feature = "node-receiver")]
    {
        let flash = RamFlash::new();
        let mut receiver =
            protocol::Receiver::new(NullRadio, Millis, Millis, CycleRng, flash);
        let completion = receiver.run();

        match completion {
            Completion::Transferred => {
                receiver.radio_mut().disable();
                // SAFETY: Transferred means every page committed, so the
                // region starting at USER_BASE holds a complete image.
                unsafe {
                    chain(protocol::config::USER_BASE);
                }
            }
            Completion::Abandoned(_) => {}
        }
    }

    loop {
        cortex_m::asm::wfi();
    }
}
