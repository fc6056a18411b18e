//! Wire protocol layer for serimidi.
//!
//! Serial MIDI is a bare byte stream: most messages have no delimiter, sysex
//! is open-ended, and a debug text channel is multiplexed onto the same
//! wire. This crate reconstructs discrete frames from that stream and
//! translates between wire bytes and sequencer bus events, in both
//! directions. It performs no I/O of its own — the decoder runs over any
//! [`std::io::Read`].

pub mod decoder;
pub mod event;
pub mod frame;

pub use decoder::{FrameDecoder, MAX_FRAME_BYTES};
pub use event::{BusEvent, EventParseError, WireBytes};
pub use frame::{VoiceOp, WireFrame};
