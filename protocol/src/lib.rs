//! Reliable one-to-many page transfer over a lossy, half-duplex radio
//! broadcast link.
//!
//! This crate is the protocol core: the wire codec lives in `radiolink`,
//! the flash abstraction in `storage`; this crate adds the sender and
//! receiver state machines that coordinate both under loss, duplication,
//! and reordering, plus the external-collaborator traits (`hal`) that let
//! the same state machines run against a simulated medium in tests or a
//! real radio/flash on a board.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod commit;
pub mod config;
pub mod geometry;
pub mod hal;

#[cfg(feature = "sender")]
pub mod sender;
#[cfg(feature = "receiver")]
pub mod receiver;

#[cfg(feature = "sender")]
pub use sender::Sender;
#[cfg(feature = "receiver")]
pub use receiver::{AbandonReason, Completion, Receiver};

pub use radiolink::{self, Frame};
