//! Logical frame types produced by the wire decoder.

/// Channel-voice operation class, from the high nibble of a status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceOp {
    NoteOn,
    NoteOff,
    PolyPressure,
    Controller,
    ProgramChange,
    ChannelPressure,
    PitchBend,
}

impl VoiceOp {
    /// Classify a status byte; `None` if it is not a channel-voice status.
    pub fn from_status(status: u8) -> Option<VoiceOp> {
        match status & 0xF0 {
            0x90 => Some(VoiceOp::NoteOn),
            0x80 => Some(VoiceOp::NoteOff),
            0xA0 => Some(VoiceOp::PolyPressure),
            0xB0 => Some(VoiceOp::Controller),
            0xC0 => Some(VoiceOp::ProgramChange),
            0xD0 => Some(VoiceOp::ChannelPressure),
            0xE0 => Some(VoiceOp::PitchBend),
            _ => None,
        }
    }

    /// Data bytes carried after the status byte.
    #[inline]
    pub fn data_len(self) -> usize {
        match self {
            VoiceOp::ProgramChange | VoiceOp::ChannelPressure => 1,
            _ => 2,
        }
    }
}

/// One complete logical unit reconstructed from the serial stream.
///
/// The decoder emits exactly one variant per decode cycle, never a partial
/// frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireFrame {
    /// Channel voice message; `len` is the number of valid bytes in `data`.
    ChannelVoice { status: u8, data: [u8; 2], len: u8 },
    /// System common message (`F1`/`F2`/`F3`/`F6`).
    SystemCommon { status: u8, data: [u8; 2], len: u8 },
    /// Single-byte system realtime message.
    SystemRealtime { status: u8 },
    /// Complete sysex sequence, leading `F0` and closing `F7` included.
    SysEx(Vec<u8>),
    /// Debug text extracted from the `FF 00 00` side channel.
    Text(Vec<u8>),
    /// Status byte the bridge does not translate.
    Unknown { status: u8 },
}

impl WireFrame {
    /// Channel number for channel-voice frames.
    pub fn channel(&self) -> Option<u8> {
        match self {
            WireFrame::ChannelVoice { status, .. } => Some(status & 0x0F),
            _ => None,
        }
    }

    /// Operation class for channel-voice frames.
    pub fn op(&self) -> Option<VoiceOp> {
        match self {
            WireFrame::ChannelVoice { status, .. } => VoiceOp::from_status(*status),
            _ => None,
        }
    }
}
