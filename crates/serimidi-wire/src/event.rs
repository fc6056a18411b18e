//! Sequencer bus events and the byte translations in both directions.

use std::fmt;

use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::frame::{VoiceOp, WireFrame};

/// Encoded message bytes; everything but sysex fits inline.
pub type WireBytes = SmallVec<[u8; 3]>;

/// One sequencer event — the unit both translators exchange with the bus.
///
/// The enum is closed on purpose: both translators match it exhaustively,
/// so adding a kind without wiring it up fails to compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    Controller { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// Signed bend, `-8192..=8191`; 0 is center.
    PitchBend { channel: u8, value: i16 },
    /// MTC quarter-frame payload byte.
    QuarterFrame { value: u8 },
    /// 14-bit song position pointer.
    SongPosition { position: u16 },
    SongSelect { song: u8 },
    TuneRequest,
    Clock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    /// Opaque payload, `F0 .. F7` inclusive, forwarded byte for byte.
    SysEx(Vec<u8>),
}

/// Raised when bus bytes do not map onto a supported event kind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventParseError {
    #[error("truncated bus message, status {status:#04X}")]
    Truncated { status: u8 },

    #[error("unsupported bus message, status {status:#04X}")]
    Unsupported { status: u8 },
}

#[inline]
fn combine14(lsb: u8, msb: u8) -> u16 {
    (lsb & 0x7F) as u16 | (((msb & 0x7F) as u16) << 7)
}

impl BusEvent {
    /// Translate a decoded wire frame. `Text` and `Unknown` frames carry no
    /// bus event.
    pub fn from_frame(frame: WireFrame) -> Option<BusEvent> {
        match frame {
            WireFrame::ChannelVoice { status, data, .. } => {
                let channel = status & 0x0F;
                let event = match VoiceOp::from_status(status)? {
                    VoiceOp::NoteOn => BusEvent::NoteOn {
                        channel,
                        note: data[0],
                        velocity: data[1],
                    },
                    VoiceOp::NoteOff => BusEvent::NoteOff {
                        channel,
                        note: data[0],
                        velocity: data[1],
                    },
                    VoiceOp::PolyPressure => BusEvent::PolyPressure {
                        channel,
                        note: data[0],
                        pressure: data[1],
                    },
                    VoiceOp::Controller => BusEvent::Controller {
                        channel,
                        controller: data[0],
                        value: data[1],
                    },
                    VoiceOp::ProgramChange => BusEvent::ProgramChange {
                        channel,
                        program: data[0],
                    },
                    VoiceOp::ChannelPressure => BusEvent::ChannelPressure {
                        channel,
                        pressure: data[0],
                    },
                    // Two 7-bit halves, LSB first, rebiased to the signed
                    // range the sequencer side uses.
                    VoiceOp::PitchBend => BusEvent::PitchBend {
                        channel,
                        value: combine14(data[0], data[1]) as i16 - 8192,
                    },
                };
                Some(event)
            }
            WireFrame::SystemCommon { status, data, .. } => match status {
                0xF1 => Some(BusEvent::QuarterFrame { value: data[0] }),
                0xF2 => Some(BusEvent::SongPosition {
                    position: combine14(data[0], data[1]),
                }),
                0xF3 => Some(BusEvent::SongSelect { song: data[0] }),
                0xF6 => Some(BusEvent::TuneRequest),
                _ => None,
            },
            WireFrame::SystemRealtime { status } => match status {
                0xF8 => Some(BusEvent::Clock),
                0xFA => Some(BusEvent::Start),
                0xFB => Some(BusEvent::Continue),
                0xFC => Some(BusEvent::Stop),
                0xFE => Some(BusEvent::ActiveSensing),
                _ => None,
            },
            WireFrame::SysEx(payload) => Some(BusEvent::SysEx(payload)),
            WireFrame::Text(_) | WireFrame::Unknown { .. } => None,
        }
    }

    /// Parse one complete message as delivered by the sequencer.
    pub fn from_bytes(bytes: &[u8]) -> Result<BusEvent, EventParseError> {
        let &status = bytes
            .first()
            .ok_or(EventParseError::Truncated { status: 0 })?;
        let data = |i: usize| {
            bytes
                .get(i)
                .map(|b| b & 0x7F)
                .ok_or(EventParseError::Truncated { status })
        };
        match status {
            0xF0 => Ok(BusEvent::SysEx(bytes.to_vec())),
            0xF1 => Ok(BusEvent::QuarterFrame { value: data(1)? }),
            0xF2 => Ok(BusEvent::SongPosition {
                position: combine14(data(1)?, data(2)?),
            }),
            0xF3 => Ok(BusEvent::SongSelect { song: data(1)? }),
            0xF6 => Ok(BusEvent::TuneRequest),
            0xF8 => Ok(BusEvent::Clock),
            0xFA => Ok(BusEvent::Start),
            0xFB => Ok(BusEvent::Continue),
            0xFC => Ok(BusEvent::Stop),
            0xFE => Ok(BusEvent::ActiveSensing),
            s if s >= 0xF0 => Err(EventParseError::Unsupported { status }),
            s if s >= 0x80 => {
                let channel = s & 0x0F;
                match s & 0xF0 {
                    0x90 => Ok(BusEvent::NoteOn {
                        channel,
                        note: data(1)?,
                        velocity: data(2)?,
                    }),
                    0x80 => Ok(BusEvent::NoteOff {
                        channel,
                        note: data(1)?,
                        velocity: data(2)?,
                    }),
                    0xA0 => Ok(BusEvent::PolyPressure {
                        channel,
                        note: data(1)?,
                        pressure: data(2)?,
                    }),
                    0xB0 => Ok(BusEvent::Controller {
                        channel,
                        controller: data(1)?,
                        value: data(2)?,
                    }),
                    0xC0 => Ok(BusEvent::ProgramChange {
                        channel,
                        program: data(1)?,
                    }),
                    0xD0 => Ok(BusEvent::ChannelPressure {
                        channel,
                        pressure: data(1)?,
                    }),
                    _ => Ok(BusEvent::PitchBend {
                        channel,
                        value: combine14(data(1)?, data(2)?) as i16 - 8192,
                    }),
                }
            }
            _ => Err(EventParseError::Unsupported { status }),
        }
    }

    /// Standard MIDI serialization, used at the sequencer boundary.
    pub fn to_bytes(&self) -> WireBytes {
        match self {
            BusEvent::NoteOn {
                channel,
                note,
                velocity,
            } => smallvec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            BusEvent::NoteOff {
                channel,
                note,
                velocity,
            } => smallvec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            BusEvent::PolyPressure {
                channel,
                note,
                pressure,
            } => smallvec![0xA0 | (channel & 0x0F), note & 0x7F, pressure & 0x7F],
            BusEvent::Controller {
                channel,
                controller,
                value,
            } => smallvec![0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
            BusEvent::ProgramChange { channel, program } => {
                smallvec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            BusEvent::ChannelPressure { channel, pressure } => {
                smallvec![0xD0 | (channel & 0x0F), pressure & 0x7F]
            }
            BusEvent::PitchBend { channel, value } => {
                let unsigned = (value + 8192).clamp(0, 16383) as u16;
                smallvec![
                    0xE0 | (channel & 0x0F),
                    (unsigned & 0x7F) as u8,
                    (unsigned >> 7) as u8
                ]
            }
            BusEvent::QuarterFrame { value } => smallvec![0xF1, value & 0x7F],
            BusEvent::SongPosition { position } => {
                let p = position & 0x3FFF;
                smallvec![0xF2, (p & 0x7F) as u8, (p >> 7) as u8]
            }
            BusEvent::SongSelect { song } => smallvec![0xF3, song & 0x7F],
            BusEvent::TuneRequest => smallvec![0xF6],
            BusEvent::Clock => smallvec![0xF8],
            BusEvent::Start => smallvec![0xFA],
            BusEvent::Continue => smallvec![0xFB],
            BusEvent::Stop => smallvec![0xFC],
            BusEvent::ActiveSensing => smallvec![0xFE],
            BusEvent::SysEx(payload) => SmallVec::from_slice(payload),
        }
    }

    /// Serial-side encoding. Identical to [`BusEvent::to_bytes`] except that
    /// song position leaves with the same +8192 bias pitch bend carries.
    pub fn to_wire_bytes(&self) -> WireBytes {
        match self {
            BusEvent::SongPosition { position } => {
                let biased = position + 8192;
                smallvec![0xF2, (biased & 0x7F) as u8, ((biased >> 7) & 0x7F) as u8]
            }
            _ => self.to_bytes(),
        }
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusEvent::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "90 Note on            {channel:02X} {note:02X} {velocity:02X}"),
            BusEvent::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "80 Note off           {channel:02X} {note:02X} {velocity:02X}"),
            BusEvent::PolyPressure {
                channel,
                note,
                pressure,
            } => write!(f, "A0 Pressure change    {channel:02X} {note:02X} {pressure:02X}"),
            BusEvent::Controller {
                channel,
                controller,
                value,
            } => write!(f, "B0 Controller change  {channel:02X} {controller:02X} {value:02X}"),
            BusEvent::ProgramChange { channel, program } => {
                write!(f, "C0 Program change     {channel:02X} {program:02X}")
            }
            BusEvent::ChannelPressure { channel, pressure } => {
                write!(f, "D0 Channel press      {channel:02X} {pressure:02X}")
            }
            BusEvent::PitchBend { channel, value } => {
                write!(f, "E0 Pitch bend         {channel:02X} {:04X}", value + 8192)
            }
            BusEvent::QuarterFrame { value } => {
                write!(f, "F1 MTC Quarter Frame  {value:02X}")
            }
            BusEvent::SongPosition { position } => {
                write!(f, "F2 Song Position      {position:04X}")
            }
            BusEvent::SongSelect { song } => write!(f, "F3 Song Select        {song:02X}"),
            BusEvent::TuneRequest => write!(f, "F6 Tune Request"),
            BusEvent::Clock => write!(f, "F8 Clock"),
            BusEvent::Start => write!(f, "FA Start"),
            BusEvent::Continue => write!(f, "FB Continue"),
            BusEvent::Stop => write!(f, "FC Stop"),
            BusEvent::ActiveSensing => write!(f, "FE Active sense"),
            BusEvent::SysEx(payload) => {
                write!(f, "F0 Sysex len = {:04X}  ", payload.len())?;
                for byte in payload {
                    write!(f, "{byte:02X} ")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_encoding() {
        let event = BusEvent::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        };
        assert_eq!(event.to_bytes().as_slice(), &[0x90, 60, 100]);

        let event = BusEvent::NoteOn {
            channel: 15,
            note: 60,
            velocity: 100,
        };
        assert_eq!(event.to_bytes()[0], 0x9F);
    }

    #[test]
    fn test_data_byte_masking() {
        let event = BusEvent::Controller {
            channel: 0,
            controller: 0xFF,
            value: 0xFF,
        };
        assert_eq!(event.to_bytes().as_slice(), &[0xB0, 0x7F, 0x7F]);
    }

    #[test]
    fn test_pitch_bend_center() {
        let event = BusEvent::PitchBend {
            channel: 0,
            value: 0,
        };
        assert_eq!(event.to_bytes().as_slice(), &[0xE0, 0x00, 0x40]);
    }

    #[test]
    fn test_pitch_bend_extremes_clamp() {
        let event = BusEvent::PitchBend {
            channel: 0,
            value: 8191,
        };
        assert_eq!(event.to_bytes().as_slice(), &[0xE0, 0x7F, 0x7F]);

        let event = BusEvent::PitchBend {
            channel: 0,
            value: -8192,
        };
        assert_eq!(event.to_bytes().as_slice(), &[0xE0, 0x00, 0x00]);
    }

    #[test]
    fn test_pitch_bend_wire_decode_to_zero() {
        // E0 00 40 is the center position on the wire.
        let frame = WireFrame::ChannelVoice {
            status: 0xE0,
            data: [0x00, 0x40],
            len: 2,
        };
        let event = BusEvent::from_frame(frame).unwrap();
        assert_eq!(
            event,
            BusEvent::PitchBend {
                channel: 0,
                value: 0,
            }
        );
        assert_eq!(event.to_wire_bytes().as_slice(), &[0xE0, 0x00, 0x40]);
    }

    #[test]
    fn test_song_position_decodes_raw() {
        let frame = WireFrame::SystemCommon {
            status: 0xF2,
            data: [0x01, 0x02],
            len: 2,
        };
        assert_eq!(
            BusEvent::from_frame(frame),
            Some(BusEvent::SongPosition { position: 0x0101 })
        );
    }

    #[test]
    fn test_song_position_bus_bytes_are_raw() {
        let event = BusEvent::SongPosition { position: 0 };
        assert_eq!(event.to_bytes().as_slice(), &[0xF2, 0x00, 0x00]);
    }

    #[test]
    fn test_song_position_wire_bytes_are_biased() {
        // The serial side carries song position shifted by 8192, the same
        // bias pitch bend uses.
        let event = BusEvent::SongPosition { position: 0 };
        assert_eq!(event.to_wire_bytes().as_slice(), &[0xF2, 0x00, 0x40]);
    }

    #[test]
    fn test_sysex_passthrough() {
        let payload = vec![0xF0, 0x01, 0x02, 0x03, 0xF7];
        let event = BusEvent::from_frame(WireFrame::SysEx(payload.clone())).unwrap();
        assert_eq!(event, BusEvent::SysEx(payload.clone()));
        assert_eq!(event.to_wire_bytes().as_slice(), payload.as_slice());
        assert_eq!(event.to_bytes().as_slice(), payload.as_slice());
    }

    #[test]
    fn test_realtime_single_byte_encodings() {
        let cases = [
            (BusEvent::Clock, 0xF8),
            (BusEvent::Start, 0xFA),
            (BusEvent::Continue, 0xFB),
            (BusEvent::Stop, 0xFC),
            (BusEvent::ActiveSensing, 0xFE),
        ];
        for (event, status) in cases {
            assert_eq!(event.to_wire_bytes().as_slice(), &[status]);
        }
    }

    #[test]
    fn test_from_bytes_note_on() {
        let event = BusEvent::from_bytes(&[0x95, 60, 100]).unwrap();
        assert_eq!(
            event,
            BusEvent::NoteOn {
                channel: 5,
                note: 60,
                velocity: 100,
            }
        );
    }

    #[test]
    fn test_from_bytes_pitch_bend_center() {
        let event = BusEvent::from_bytes(&[0xE0, 0x00, 0x40]).unwrap();
        assert_eq!(
            event,
            BusEvent::PitchBend {
                channel: 0,
                value: 0,
            }
        );
    }

    #[test]
    fn test_from_bytes_roundtrips_to_bytes() {
        let events = [
            BusEvent::NoteOff {
                channel: 3,
                note: 64,
                velocity: 0,
            },
            BusEvent::Controller {
                channel: 1,
                controller: 7,
                value: 127,
            },
            BusEvent::ProgramChange {
                channel: 9,
                program: 42,
            },
            BusEvent::ChannelPressure {
                channel: 2,
                pressure: 33,
            },
            BusEvent::QuarterFrame { value: 0x31 },
            BusEvent::SongPosition { position: 0x1234 },
            BusEvent::SongSelect { song: 9 },
            BusEvent::TuneRequest,
            BusEvent::Stop,
        ];
        for event in events {
            let parsed = BusEvent::from_bytes(&event.to_bytes()).unwrap();
            assert_eq!(parsed, event);
        }
    }

    #[test]
    fn test_from_bytes_unsupported_status() {
        assert_eq!(
            BusEvent::from_bytes(&[0xF9]),
            Err(EventParseError::Unsupported { status: 0xF9 })
        );
        assert_eq!(
            BusEvent::from_bytes(&[0x42]),
            Err(EventParseError::Unsupported { status: 0x42 })
        );
    }

    #[test]
    fn test_from_bytes_truncated() {
        assert_eq!(
            BusEvent::from_bytes(&[0x90, 60]),
            Err(EventParseError::Truncated { status: 0x90 })
        );
        assert!(BusEvent::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_text_and_unknown_frames_carry_no_event() {
        assert_eq!(BusEvent::from_frame(WireFrame::Text(b"hi".to_vec())), None);
        assert_eq!(
            BusEvent::from_frame(WireFrame::Unknown { status: 0xF9 }),
            None
        );
    }
}
