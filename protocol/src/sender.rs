//! Sender state machine.
//!
//! One page at a time: burst every packet, mark the end with three
//! end-of-page frames, then sit in a recovery loop retransmitting whatever
//! gets NAKed until a run of quiet rounds says every listening receiver has
//! converged. The sender never learns who is out there, never declares
//! failure, and never varies its pacing based on what it hears. All of the
//! reliability pressure lives on the receiver side.

use heapless::Vec as HVec;
use storage::ReadFlash;

use crate::config::{N_EMPTY, NAK_WINDOW_MS, PAYLOAD, PPP, SEND_JITTER_MS, T_SLEEP_MS};
use crate::geometry::{packet_offset, packets_this_page, total_packets, total_pages};
use crate::hal::{Clock, Radio, Rng, Sleep};

#[cfg(feature = "defmt-log")]
use defmt::trace;

/// Diagnostic counters. No protocol meaning; exposed purely for the
/// board's progress display.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub pages_sent: u32,
    pub packets_sent: u32,
    pub retransmits: u32,
}

pub struct Sender<F, R, C, S, Rn> {
    image: F,
    image_len: usize,
    radio: R,
    clock: C,
    sleep: S,
    rng: Rn,
    stats: Stats,
}

impl<F, R, C, S, Rn> Sender<F, R, C, S, Rn>
where
    F: ReadFlash,
    R: Radio,
    C: Clock,
    S: Sleep,
    Rn: Rng,
{
    /// `image` owns the sender's source region; `image_len` is the
    /// meaningful length within it.
    pub fn new(image: F, image_len: usize, radio: R, clock: C, sleep: S, rng: Rn) -> Self {
        Sender { image, image_len, radio, clock, sleep, rng, stats: Stats::default() }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Run to completion: transmits the whole image, page by page, and
    /// returns once the last page's quiescent period has elapsed.
    pub fn run(&mut self) {
        let total_pages = total_pages(self.image_len);
        let total_packets = total_packets(self.image_len);
        for page in 1..=total_pages {
            self.run_page(page, total_pages, total_packets);
        }
    }

    fn read_payload(&mut self, page: u16, seq: u16) -> [u8; PAYLOAD] {
        let mut payload = [0u8; PAYLOAD];
        let offset = packet_offset(page, seq);
        let remaining = self.image_len.saturating_sub(offset);
        let n = remaining.min(PAYLOAD);
        if n > 0 {
            // Short reads on the final, partial packet: the rest of the
            // frame's data region is whatever was already in `payload`
            // (zero, here); the receiver bounds itself by total_packets.
            let _ = self.image.read(offset, &mut payload[..n]);
        }
        payload
    }

    fn sleep_with_jitter(&mut self) {
        let jitter = self.rng.rand(SEND_JITTER_MS + 1);
        self.sleep.sleep_ms(T_SLEEP_MS + jitter);
    }

    fn run_page(&mut self, page: u16, total_pages: u16, total_packets: u16) {
        let ppp_this_page = packets_this_page(total_packets, total_pages, page);
        let mut received_naks: HVec<u16, PPP> = HVec::new();

        // Burst phase.
        for seq in 1..=ppp_this_page {
            let payload = self.read_payload(page, seq);
            let frame = radiolink::encode_data(seq, page, total_packets, &payload);
            self.radio.send(&frame);
            self.stats.packets_sent += 1;
            self.sleep_with_jitter();
        }

        // End-of-page phase: three copies to survive single-frame loss.
        for _ in 0..3 {
            let frame = radiolink::encode_end_of_page(page);
            self.radio.send(&frame);
            self.sleep_with_jitter();
        }

        // Recovery phase.
        let mut last_nak_time = self.clock.now_ms();
        let mut empty_rounds = 0u32;
        while empty_rounds < N_EMPTY {
            self.sleep.sleep_ms(T_SLEEP_MS);

            while let Some(bytes) = self.radio.recv() {
                if let Ok(radiolink::Frame::Nak { seq, page: nak_page }) = radiolink::parse(&bytes) {
                    if nak_page == page {
                        if !received_naks.contains(&seq) {
                            let _ = received_naks.push(seq);
                        }
                        last_nak_time = self.clock.now_ms();
                    }
                    // NAK for a different page: stale, from a prior page
                    // or a receiver that has already moved on. Ignored.
                }
            }

            let now = self.clock.now_ms();
            let elapsed = now.wrapping_sub(last_nak_time);

            if received_naks.is_empty() {
                if elapsed > 2 * NAK_WINDOW_MS {
                    empty_rounds += 1;
                    last_nak_time = now;
                }
            } else if elapsed > NAK_WINDOW_MS {
                #[cfg(feature = "defmt-log")]
                trace!("page {}: retransmitting {} naked packets", page, received_naks.len());
                for &seq in received_naks.iter() {
                    let payload = self.read_payload(page, seq);
                    let frame = radiolink::encode_data(seq, page, total_packets, &payload);
                    self.radio.send(&frame);
                    self.stats.retransmits += 1;
                    self.sleep_with_jitter();
                }
                received_naks.clear();
                let frame = radiolink::encode_end_of_page(page);
                self.radio.send(&frame);
                last_nak_time = now;
                empty_rounds = 0;
            }
        }

        self.stats.pages_sent += 1;
    }
}
