//! External-collaborator seams. The sender and receiver state machines are
//! generic over these so the exact same code runs against a simulated
//! radio/flash in tests and a real one on a board.
//!
//! None of these traits return a `Result` for the ordinary empty/busy
//! paths: an empty receive and a busy flash write are the normal idle path
//! for this protocol, not errors.

use radiolink::DATA_FRAME_LEN;

/// Best-effort broadcast radio. The wire only ever carries frames of at
/// most `DATA_FRAME_LEN` bytes, but `recv` may hand back whatever length
/// the underlying link delivered; `radiolink::parse` tolerates both
/// shorter and longer buffers.
pub trait Radio {
    /// Broadcast `frame`. Never blocks for long and never fails the
    /// caller; the link has no acknowledgement to fail against.
    fn send(&mut self, frame: &[u8]);

    /// Non-blocking receive. `None` means "nothing waiting right now",
    /// which is the ordinary idle path, not an error.
    fn recv(&mut self) -> Option<heapless::Vec<u8, DATA_FRAME_LEN>>;

    /// Silence the transceiver. Called once, after a transfer completes,
    /// before the board resets into the image it just received.
    fn disable(&mut self);
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Cooperative sleep, used for pacing, jitter, and the flash BUSY retry
/// wait. Must sleep at least `ms`.
pub trait Sleep {
    fn sleep_ms(&mut self, ms: u32);
}

/// Small-integer RNG, used only for jitter and NAK desynchronization.
pub trait Rng {
    /// Uniform integer in `[0, n)`. Implementations should treat `n == 0`
    /// as always returning `0`.
    fn rand(&mut self, n: u32) -> u32;
}
