//! serimidi connects serial port MIDI devices to software MIDI ports.
//!
//! Hardware that speaks raw MIDI over a serial line (microcontrollers,
//! sysex-configurable controllers) shows up as a sequencer client with a
//! "MIDI out" and a "MIDI in" port. Everything the device sends is
//! published as bus events; everything written to the input port is
//! serialized back onto the wire, sysex included.

pub mod bridge;
pub mod config;
pub mod error;
pub mod serial;

pub use config::Config;
pub use error::{Error, Result};
