//! Wire-level round trips: decode a byte stream, translate to a bus event,
//! encode back, and compare with the original bytes.

use std::io::Cursor;

use serimidi_wire::{BusEvent, FrameDecoder, WireFrame};

fn roundtrip(bytes: &[u8]) -> Vec<u8> {
    let mut decoder = FrameDecoder::new();
    let (frame, consumed) = decoder.read_frame(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(consumed, bytes.len());
    let event = BusEvent::from_frame(frame).expect("frame should translate");
    event.to_wire_bytes().to_vec()
}

#[test]
fn test_three_byte_voice_messages_roundtrip() {
    for status in (0x80u8..=0xBF).chain(0xE0..=0xEF) {
        let original = [status, 0x33, 0x55];
        assert_eq!(roundtrip(&original), original, "status {status:02X}");
    }
}

#[test]
fn test_two_byte_voice_messages_roundtrip() {
    for status in 0xC0u8..=0xDF {
        let original = [status, 0x2A];
        assert_eq!(roundtrip(&original), original, "status {status:02X}");
    }
}

#[test]
fn test_sysex_roundtrip() {
    let original = [0xF0, 0x01, 0x02, 0x03, 0xF7];
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_realtime_roundtrip() {
    for status in [0xF8, 0xFA, 0xFB, 0xFC, 0xFE] {
        assert_eq!(roundtrip(&[status]), [status]);
    }
}

#[test]
fn test_system_common_roundtrip() {
    assert_eq!(roundtrip(&[0xF1, 0x42]), [0xF1, 0x42]);
    assert_eq!(roundtrip(&[0xF3, 0x09]), [0xF3, 0x09]);
    assert_eq!(roundtrip(&[0xF6]), [0xF6]);
}

#[test]
fn test_pitch_bend_center_maps_to_zero() {
    let mut decoder = FrameDecoder::new();
    let (frame, _) = decoder
        .read_frame(&mut Cursor::new([0xE0, 0x00, 0x40]))
        .unwrap();
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
fn test_text_stream_consumed_without_event() {
    let stream = [0xFF, 0x00, 0x00, 0x05, b'H', b'E', b'L', b'L', b'O'];
    let mut decoder = FrameDecoder::new();
    let (frame, consumed) = decoder.read_frame(&mut Cursor::new(stream)).unwrap();
    assert_eq!(consumed, 9);
    assert_eq!(frame, WireFrame::Text(b"HELLO".to_vec()));
    assert_eq!(BusEvent::from_frame(frame), None);
}

#[test]
fn test_injected_status_does_not_merge_frames() {
    // A Note On interrupted by a fresh status byte: the partial frame is
    // dropped, the new frame decodes normally, and the stream stays usable.
    let stream = [0x90, 0x91, 0x3C, 0x64, 0x80, 0x3C, 0x00];
    let mut decoder = FrameDecoder::new();
    let mut src = Cursor::new(stream);

    let (frame, _) = decoder.read_frame(&mut src).unwrap();
    assert_eq!(
        BusEvent::from_frame(frame),
        Some(BusEvent::NoteOn {
            channel: 1,
            note: 0x3C,
            velocity: 0x64,
        })
    );

    let (frame, _) = decoder.read_frame(&mut src).unwrap();
    assert_eq!(
        BusEvent::from_frame(frame),
        Some(BusEvent::NoteOff {
            channel: 0,
            note: 0x3C,
            velocity: 0,
        })
    );
}

#[test]
fn test_mixed_stream_decodes_in_order() {
    // Voice, realtime, sysex, and a program change back to back.
    let stream = [
        0x93, 0x40, 0x70, // note on, channel 3
        0xF8, // clock
        0xF0, 0x7E, 0x00, 0x09, 0x01, 0xF7, // GM reset sysex
        0xC2, 0x05, // program change, channel 2
    ];
    let mut decoder = FrameDecoder::new();
    let mut src = Cursor::new(stream);
    let mut events = Vec::new();
    while let Ok((frame, _)) = decoder.read_frame(&mut src) {
        events.extend(BusEvent::from_frame(frame));
    }
    assert_eq!(
        events,
        vec![
            BusEvent::NoteOn {
                channel: 3,
                note: 0x40,
                velocity: 0x70,
            },
            BusEvent::Clock,
            BusEvent::SysEx(vec![0xF0, 0x7E, 0x00, 0x09, 0x01, 0xF7]),
            BusEvent::ProgramChange {
                channel: 2,
                program: 5,
            },
        ]
    );
}
