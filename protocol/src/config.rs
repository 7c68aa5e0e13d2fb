//! Compile-time configuration.
//!
//! There is no operator surface: a node is built as a sender or a receiver
//! by enabling the `sender`/`receiver` Cargo feature, and the geometry and
//! timing constants below are fixed at compile time. USER_BASE/USER_END
//! are compiled in rather than threaded through runtime configuration,
//! matching this workspace's other per-board constants.

pub use radiolink::{DATA_FRAME_LEN, HEADER, PAGE, PAYLOAD, PPP};

/// Base pacing interval between frames and poll ticks.
pub const T_SLEEP_MS: u32 = 100;
/// NAK pacing / quiescence window.
pub const NAK_WINDOW_MS: u32 = 3 * T_SLEEP_MS;
/// Consecutive empty recovery rounds the sender waits for before moving on.
pub const N_EMPTY: u32 = 5;
/// Upper bound (exclusive) of the jitter added between burst/end-of-page sends.
pub const SEND_JITTER_MS: u32 = 5;

/// Receiver's recovery-entry watchdog: force RECOVERY after this much
/// silence since the last accepted DATA frame.
pub const RECOVERY_WATCHDOG_MS: u32 = 4 * NAK_WINDOW_MS;
/// Receiver's abandonment watchdog: give up entirely after this much
/// silence following at least one accepted packet.
pub const ABANDON_WATCHDOG_MS: u32 = 100 * NAK_WINDOW_MS;
/// Background tick period for the receiver's recovery/watchdog logic.
pub const BACKGROUND_TICK_MS: u32 = T_SLEEP_MS / 2;

/// Reference embodiment flash destination: six 4 KiB slots.
pub const USER_BASE: usize = 0x71000;
pub const USER_END: usize = 0x77000;
