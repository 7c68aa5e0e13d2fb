//! Deterministic small-integer RNG for jitter, backed by a seeded
//! xoshiro generator.

use rand::{Rng as _, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use protocol::hal::Rng;

pub struct SimRng {
    inner: Xoshiro256Plus,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng { inner: Xoshiro256Plus::seed_from_u64(seed) }
    }
}

impl Rng for SimRng {
    fn rand(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.inner.gen_range(0..n)
        }
    }
}
