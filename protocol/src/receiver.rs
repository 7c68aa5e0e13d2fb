//! Receiver state machine.
//!
//! Accumulates one page at a time into a single page-sized buffer, tracks
//! which sequence numbers are still missing, and NAKs for them once it
//! decides (on an end-of-page marker, a peer's NAK, or plain inactivity)
//! that the sender has moved past the burst. Each completed page is
//! committed to flash before the receiver clears its state and waits for
//! the next one. Never anything is acknowledged positively; the sender
//! never finds out a receiver succeeded, only that nobody is asking for
//! more.

use radiolink::Frame;

use crate::commit::{self, SupervisorFlash};
use crate::config::{
    ABANDON_WATCHDOG_MS, BACKGROUND_TICK_MS, NAK_WINDOW_MS, PAGE, PAYLOAD, PPP,
    RECOVERY_WATCHDOG_MS, USER_BASE,
};
use crate::geometry::{packets_this_page, total_pages_from_packets};
use crate::hal::{Clock, Radio, Rng, Sleep};

#[cfg(feature = "defmt-log")]
use defmt::trace;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum PageState {
    Receiving,
    Recovery,
}

/// Why a receiver stopped before `current_page` could advance past the
/// last page.
#[derive(Debug)]
pub enum AbandonReason<E> {
    /// The global inactivity watchdog fired; no automatic retry.
    Inactivity,
    /// The flash controller reported something other than BUSY.
    Flash(E),
}

/// Outcome of `run`.
#[derive(Debug)]
pub enum Completion<E> {
    /// Every page committed; the board should reset into the new image.
    Transferred,
    Abandoned(AbandonReason<E>),
}

/// Diagnostic counters. No protocol meaning.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub pages_committed: u32,
    pub naks_sent: u32,
}

pub struct Receiver<R, C, S, Rn, F> {
    radio: R,
    clock: C,
    sleep: S,
    rng: Rn,
    flash: F,

    current_page: u16,
    page_state: PageState,
    buffer: [u8; PAGE],
    present: [bool; PPP],
    heard_nak: [bool; PPP],
    packets_this_page: u16,

    total_packets: Option<u16>,
    total_pages: Option<u16>,
    region_erased: bool,

    started: bool,
    last_rx_time: u32,
    ready_to_nak_at: Option<u32>,

    stats: Stats,
    completion: Option<Completion<F::Error>>,
}

impl<R, C, S, Rn, F> Receiver<R, C, S, Rn, F>
where
    R: Radio,
    C: Clock,
    S: Sleep,
    Rn: Rng,
    F: SupervisorFlash,
{
    pub fn new(radio: R, clock: C, sleep: S, rng: Rn, flash: F) -> Self {
        let now = clock.now_ms();
        Receiver {
            radio,
            clock,
            sleep,
            rng,
            flash,
            current_page: 1,
            page_state: PageState::Receiving,
            buffer: [0u8; PAGE],
            present: [false; PPP],
            heard_nak: [false; PPP],
            packets_this_page: PPP as u16,
            total_packets: None,
            total_pages: None,
            region_erased: false,
            started: false,
            last_rx_time: now,
            ready_to_nak_at: None,
            stats: Stats::default(),
            completion: None,
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    /// Access to the underlying flash, e.g. to inspect what was committed
    /// after `run` returns.
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Access to the underlying radio, e.g. to disable it after `run`
    /// returns `Completion::Transferred` and before resetting into the
    /// image that was just committed.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Run until the image is fully received and committed, or the
    /// inactivity watchdog gives up.
    pub fn run(&mut self) -> Completion<F::Error> {
        loop {
            while let Some(bytes) = self.radio.recv() {
                self.handle_frame(&bytes);
                if let Some(c) = self.completion.take() {
                    return c;
                }
            }

            self.background_tick();
            if let Some(c) = self.completion.take() {
                return c;
            }

            self.sleep.sleep_ms(BACKGROUND_TICK_MS);
        }
    }

    fn handle_frame(&mut self, bytes: &[u8]) {
        match radiolink::parse(bytes) {
            Ok(Frame::Data { seq, page, total_packets, payload }) => {
                self.on_data(seq, page, total_packets, payload)
            }
            Ok(Frame::Nak { seq, page }) => self.on_nak(seq, page),
            Ok(Frame::EndOfPage { page }) => self.on_end_of_page(page),
            // Malformed frame: dropped silently, no peer notification.
            Err(_) => {}
        }
    }

    fn on_data(&mut self, seq: u16, page: u16, total_packets: u16, payload: [u8; PAYLOAD]) {
        // A second transfer starting early, or a frame from a page we've
        // already moved past: both collapse to the same drop.
        if page != self.current_page || seq == 0 {
            return;
        }
        let idx = (seq - 1) as usize;
        if idx >= self.packets_this_page as usize || self.present[idx] {
            return;
        }

        if page == 1 && seq == 1 && self.total_packets.is_none() {
            let total_pages = total_pages_from_packets(total_packets);
            self.total_packets = Some(total_packets);
            self.total_pages = Some(total_pages);
            self.packets_this_page = packets_this_page(total_packets, total_pages, 1);
            if idx >= self.packets_this_page as usize {
                return;
            }

            if !self.region_erased {
                for p in 1..=total_pages {
                    let abs = USER_BASE + (p as usize - 1) * PAGE;
                    if let Err(e) = commit::erase(&mut self.flash, &mut self.sleep, abs) {
                        self.completion = Some(Completion::Abandoned(AbandonReason::Flash(e)));
                        return;
                    }
                }
                self.region_erased = true;
            }
        }

        self.buffer[idx * PAYLOAD..(idx + 1) * PAYLOAD].copy_from_slice(&payload);
        self.present[idx] = true;
        self.last_rx_time = self.clock.now_ms();
        self.started = true;

        if self.all_present() {
            self.commit_page();
        }
    }

    fn on_nak(&mut self, seq: u16, page: u16) {
        if page != self.current_page || seq == 0 {
            return;
        }
        let idx = (seq - 1) as usize;
        if idx >= PPP {
            return;
        }

        match self.page_state {
            PageState::Receiving => {
                self.page_state = PageState::Recovery;
                let jitter = self.rng.rand(3 * NAK_WINDOW_MS + 1);
                self.ready_to_nak_at = Some(self.clock.now_ms() + jitter);
            }
            PageState::Recovery => {
                self.heard_nak[idx] = true;
            }
        }
    }

    fn on_end_of_page(&mut self, page: u16) {
        if page != self.current_page {
            return;
        }
        self.page_state = PageState::Recovery;
        let jitter = self.rng.rand(2 * NAK_WINDOW_MS + 1);
        self.ready_to_nak_at = Some(self.clock.now_ms() + jitter);
    }

    fn background_tick(&mut self) {
        let now = self.clock.now_ms();

        if self.page_state == PageState::Recovery && !self.all_present() {
            if let Some(at) = self.ready_to_nak_at {
                if now >= at {
                    self.send_naks();
                }
            }
        }

        if self.page_state == PageState::Receiving
            && self.started
            && now.wrapping_sub(self.last_rx_time) > RECOVERY_WATCHDOG_MS
        {
            self.page_state = PageState::Recovery;
            let jitter = self.rng.rand(2 * NAK_WINDOW_MS + 1);
            self.ready_to_nak_at = Some(now + jitter);
        }

        if self.started && now.wrapping_sub(self.last_rx_time) > ABANDON_WATCHDOG_MS {
            self.completion = Some(Completion::Abandoned(AbandonReason::Inactivity));
        }
    }

    fn send_naks(&mut self) {
        #[cfg(feature = "defmt-log")]
        trace!("page {}: entering recovery, naking missing packets", self.current_page);
        for idx in 0..self.packets_this_page as usize {
            if !self.present[idx] && !self.heard_nak[idx] {
                let seq = (idx + 1) as u16;
                let frame = radiolink::encode_nak(seq, self.current_page);
                self.radio.send(&frame);
                self.stats.naks_sent += 1;
                self.sleep.sleep_ms(crate::config::T_SLEEP_MS);
            }
        }
        self.heard_nak = [false; PPP];
        self.ready_to_nak_at = None;
    }

    fn all_present(&self) -> bool {
        self.present[..self.packets_this_page as usize].iter().all(|&p| p)
    }

    fn commit_page(&mut self) {
        let slot = (self.current_page - 1) as usize;
        let abs_addr = USER_BASE + slot * PAGE;
        let write_len = self.packets_this_page as usize * PAYLOAD;

        match commit::write(&mut self.flash, &mut self.sleep, abs_addr, &self.buffer[..write_len]) {
            Ok(()) => {
                #[cfg(feature = "defmt-log")]
                trace!("page {}: committed", self.current_page);
                self.stats.pages_committed += 1;
                self.current_page += 1;

                let total_pages = self.total_pages.unwrap_or(self.current_page);
                if self.current_page > total_pages {
                    self.completion = Some(Completion::Transferred);
                    return;
                }

                self.packets_this_page =
                    packets_this_page(self.total_packets.unwrap(), total_pages, self.current_page);
                self.buffer = [0u8; PAGE];
                self.present = [false; PPP];
                self.heard_nak = [false; PPP];
                self.ready_to_nak_at = None;
                self.page_state = PageState::Receiving;
            }
            Err(e) => {
                self.completion = Some(Completion::Abandoned(AbandonReason::Flash(e)));
            }
        }
    }
}
