//! The shared broadcast medium. Every participant's `send` fans out to
//! every *other* participant's inbox (the wire is broadcast, not
//! point-to-point, and nodes don't hear their own transmissions), with
//! configurable independent packet loss and duplication, plus an optional
//! hard drop rule for the literal "this one frame never arrives"
//! scenarios.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::{Rng as _, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use protocol::hal::Radio;
use radiolink::DATA_FRAME_LEN;

#[derive(Debug, Clone, Copy)]
pub struct BusConfig {
    /// Independent per-recipient probability a delivered frame is dropped.
    pub drop_fraction: f64,
    /// Independent per-recipient probability a delivered frame is
    /// delivered twice.
    pub duplicate_fraction: f64,
    pub seed: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig { drop_fraction: 0.0, duplicate_fraction: 0.0, seed: 1 }
    }
}

type DropRule = dyn FnMut(&[u8]) -> bool + Send;

struct Inner {
    inboxes: Vec<Mutex<VecDeque<Vec<u8>>>>,
    rng: Mutex<Xoshiro256Plus>,
    drop_fraction: f64,
    duplicate_fraction: f64,
    drop_rule: Mutex<Option<Box<DropRule>>>,
}

impl Inner {
    fn broadcast(&self, from: usize, frame: &[u8]) {
        let forced_drop = {
            let mut rule = self.drop_rule.lock().unwrap();
            rule.as_mut().map(|f| f(frame)).unwrap_or(false)
        };

        for (idx, inbox) in self.inboxes.iter().enumerate() {
            if idx == from || forced_drop {
                continue;
            }

            let (dropped, duplicated) = {
                let mut rng = self.rng.lock().unwrap();
                let dropped = self.drop_fraction > 0.0 && rng.gen::<f64>() < self.drop_fraction;
                let duplicated =
                    self.duplicate_fraction > 0.0 && rng.gen::<f64>() < self.duplicate_fraction;
                (dropped, duplicated)
            };

            if dropped {
                continue;
            }
            let mut q = inbox.lock().unwrap();
            q.push_back(frame.to_vec());
            if duplicated {
                q.push_back(frame.to_vec());
            }
        }
    }

    fn recv(&self, me: usize) -> Option<heapless::Vec<u8, DATA_FRAME_LEN>> {
        let bytes = self.inboxes[me].lock().unwrap().pop_front()?;
        let mut out = heapless::Vec::new();
        let n = bytes.len().min(DATA_FRAME_LEN);
        let _ = out.extend_from_slice(&bytes[..n]);
        Some(out)
    }
}

/// A radio cell shared by one sender and any number of receivers.
/// Participants are addressed by index, assigned in the order
/// `radio_for` is called.
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    pub fn new(participants: usize, config: BusConfig) -> Self {
        let inboxes = (0..participants).map(|_| Mutex::new(VecDeque::new())).collect();
        Bus {
            inner: Arc::new(Inner {
                inboxes,
                rng: Mutex::new(Xoshiro256Plus::seed_from_u64(config.seed)),
                drop_fraction: config.drop_fraction,
                duplicate_fraction: config.duplicate_fraction,
                drop_rule: Mutex::new(None),
            }),
        }
    }

    /// Install a predicate that unconditionally drops any frame it
    /// matches, on top of whatever `BusConfig` already does.
    pub fn set_drop_rule<F: FnMut(&[u8]) -> bool + Send + 'static>(&self, rule: F) {
        *self.inner.drop_rule.lock().unwrap() = Some(Box::new(rule));
    }

    pub fn radio_for(&self, participant: usize) -> SimRadio {
        SimRadio { bus: self.inner.clone(), me: participant }
    }
}

pub struct SimRadio {
    bus: Arc<Inner>,
    me: usize,
}

impl Radio for SimRadio {
    fn send(&mut self, frame: &[u8]) {
        self.bus.broadcast(self.me, frame);
    }

    fn recv(&mut self) -> Option<heapless::Vec<u8, DATA_FRAME_LEN>> {
        self.bus.recv(self.me)
    }

    fn disable(&mut self) {}
}
