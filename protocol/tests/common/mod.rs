//! Shared harness for driving a real `Sender` against one or more real
//! `Receiver`s over `simradio`'s simulated medium, each on its own thread.
//! The closest a single-process test gets to independent single-threaded
//! event loops running on separate nodes.

use std::thread;

use protocol::receiver::Completion;
use protocol::{Receiver, Sender};
use simradio::{Bus, BusConfig, SimFlash, SimImage, SimRadio, SimRng, SimTime};

/// Virtual-to-real time compression. Large enough that a handful of pages
/// with a couple of recovery rounds each finishes in well under a second
/// of wall time.
pub const SPEEDUP: u32 = 40;

pub type TestReceiver = Receiver<SimRadio, SimTime, SimTime, SimRng, SimFlash>;
pub type DropRule = Box<dyn FnMut(&[u8]) -> bool + Send>;

pub fn image_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// Spawn one sender and `num_receivers` receivers on a shared bus, run
/// them all to completion, and return each receiver's outcome alongside
/// the receiver itself (so its `SimFlash` can be inspected).
pub fn run_scenario(
    image: Vec<u8>,
    num_receivers: usize,
    bus_config: BusConfig,
    drop_rule: Option<DropRule>,
) -> Vec<(Completion<<SimFlash as protocol::commit::SupervisorFlash>::Error>, TestReceiver)> {
    let bus = Bus::new(num_receivers + 1, bus_config);
    if let Some(rule) = drop_rule {
        bus.set_drop_rule(rule);
    }

    let image_len = image.len();
    let sender_time = SimTime::new(SPEEDUP);
    let mut sender = Sender::new(
        SimImage::new(image.clone()),
        image_len,
        bus.radio_for(0),
        sender_time.clone(),
        sender_time,
        SimRng::new(1),
    );
    let sender_handle = thread::spawn(move || sender.run());

    let receiver_handles: Vec<_> = (0..num_receivers)
        .map(|i| {
            let time = SimTime::new(SPEEDUP);
            let mut receiver = Receiver::new(
                bus.radio_for(i + 1),
                time.clone(),
                time,
                SimRng::new(100 + i as u64),
                SimFlash::new(),
            );
            thread::spawn(move || {
                let completion = receiver.run();
                (completion, receiver)
            })
        })
        .collect();

    sender_handle.join().expect("sender thread panicked");
    receiver_handles.into_iter().map(|h| h.join().expect("receiver thread panicked")).collect()
}
