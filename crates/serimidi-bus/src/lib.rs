//! Sequencer bus ports for serimidi.
//!
//! Creates a virtual client on the system sequencer (ALSA on Linux) with an
//! emit-only "MIDI out" port and a receive-only "MIDI in" port, and moves
//! [`serimidi_wire::BusEvent`]s across that boundary.

pub mod error;
pub use error::{Error, Result};

mod client;
pub use client::{open, BusPublisher, BusSubscriber};
