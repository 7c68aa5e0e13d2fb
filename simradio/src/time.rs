//! A virtual millisecond clock per participant.
//!
//! Each participant's `sleep_ms` advances its own virtual clock by exactly
//! the amount the protocol asked for, then sleeps a small, scaled-down
//! sliver of real time, just enough for the OS to actually schedule the other
//! participants' threads, not enough to make a multi-page test take
//! seconds of wall time. `Clock` and `Sleep` are separate traits the
//! state machines take as separate type parameters, so `SimTime` is
//! `Clone` and the two handles passed to a participant share the same
//! counter underneath.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use protocol::hal::{Clock, Sleep};

#[derive(Clone)]
pub struct SimTime {
    virtual_ms: Arc<AtomicU32>,
    /// Real sleep is virtual sleep divided by this factor (minimum 1ms).
    speedup: u32,
}

impl SimTime {
    pub fn new(speedup: u32) -> Self {
        SimTime { virtual_ms: Arc::new(AtomicU32::new(0)), speedup: speedup.max(1) }
    }
}

impl Clock for SimTime {
    fn now_ms(&self) -> u32 {
        self.virtual_ms.load(Ordering::Relaxed)
    }
}

impl Sleep for SimTime {
    fn sleep_ms(&mut self, ms: u32) {
        self.virtual_ms.fetch_add(ms, Ordering::Relaxed);
        let real_ms = (ms / self.speedup).max(1);
        thread::sleep(Duration::from_millis(real_ms as u64));
    }
}
