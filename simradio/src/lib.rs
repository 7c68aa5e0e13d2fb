//! Simulated radio cell and flash controller.
//!
//! The real link is a shared, broadcast, lossy, half-duplex datagram
//! medium with no link-layer acknowledgement; the real flash controller is
//! a supervisor call that can transiently refuse writes. Neither is
//! available off a developer's laptop, so this crate stands in for both:
//! `Bus` fans a sender's and receivers' broadcasts out to every other
//! participant with configurable drop/duplicate rates, `SimFlash`
//! behaves like a page-erase/page-write NOR device that can be told to
//! return BUSY a fixed number of times before succeeding, and `SimTime`
//! gives each participant its own virtual millisecond clock so a whole
//! multi-page transfer can run in a fraction of a second of real time
//! without breaking the protocol's own notion of elapsed milliseconds.
//!
//! None of this is `no_std`; it only exists to drive `protocol`'s state
//! machines from tests.

mod bus;
mod flash;
mod image;
mod rng;
mod time;

pub use bus::{Bus, BusConfig, SimRadio};
pub use flash::SimFlash;
pub use image::SimImage;
pub use rng::SimRng;
pub use time::SimTime;
