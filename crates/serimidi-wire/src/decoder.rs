//! Streaming frame decoder for the serial byte stream.
//!
//! Serial MIDI carries no delimiters for most message kinds. The decoder
//! keeps alignment by classifying status bytes (high bit set) and counting
//! the data bytes each status implies. A status byte arriving mid-frame
//! abandons the frame in progress and restarts at the new byte, so a
//! dropped byte costs one message, never the stream.

use std::io::{self, Read};

use tracing::{debug, warn};

use crate::frame::WireFrame;

/// Capacity of the reusable frame buffer; bounds sysex and text capture.
pub const MAX_FRAME_BYTES: usize = 1024;

/// Total frame length implied by a leading status byte, `None` for
/// open-ended sysex.
fn expected_len(status: u8) -> Option<usize> {
    match status {
        0xF0 => None,
        0xF1 | 0xF3 | 0xF5 => Some(2),
        // F2 carries two data bytes; FF needs two as well so the 00 00 text
        // header can complete as a frame.
        0xF2 | 0xFF => Some(3),
        0xF4 | 0xF6..=0xFE => Some(1),
        s => match s & 0xF0 {
            0xC0 | 0xD0 => Some(2),
            _ => Some(3),
        },
    }
}

/// Reusable streaming decoder. One instance per read direction; the frame
/// buffer is owned exclusively by it.
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_FRAME_BYTES),
        }
    }

    /// Read bytes from `src` until one complete frame is assembled.
    ///
    /// Returns the frame and the total number of bytes consumed, including
    /// any discarded while seeking a status byte.
    pub fn read_frame<R: Read>(&mut self, src: &mut R) -> io::Result<(WireFrame, usize)> {
        let mut consumed = 0usize;

        // Align to the start of a message: every frame begins with an
        // explicit status byte, running status is not supported.
        let first = loop {
            let b = read_byte(src)?;
            consumed += 1;
            if b & 0x80 != 0 {
                break b;
            }
            debug!("discarding {b:02X} while waiting for a status byte");
        };

        self.buf.clear();
        self.buf.push(first);
        let mut expected = expected_len(first);
        let mut dropped = 0usize;

        loop {
            if let Some(n) = expected {
                if self.buf.len() >= n {
                    break;
                }
            }

            let b = read_byte(src)?;
            consumed += 1;

            if b & 0x80 != 0 {
                // F7 closes a sysex; any other status byte mid-frame
                // abandons the frame and restarts at the new byte.
                if b == 0xF7 && self.buf[0] == 0xF0 {
                    if self.buf.len() == MAX_FRAME_BYTES {
                        // Keep the capture well formed: the terminator
                        // replaces the last retained byte.
                        self.buf.pop();
                        dropped += 1;
                    }
                    self.buf.push(b);
                    break;
                }
                debug!(
                    "status {b:02X} inside a {:02X} frame, resynchronizing",
                    self.buf[0]
                );
                self.buf.clear();
                self.buf.push(b);
                expected = expected_len(b);
                dropped = 0;
                continue;
            }

            // Data byte: sysex grows until its terminator, everything else
            // until the expected length.
            if self.buf[0] == 0xF0 {
                if self.buf.len() < MAX_FRAME_BYTES {
                    self.buf.push(b);
                } else {
                    dropped += 1;
                }
            } else {
                self.buf.push(b);
            }
        }

        if dropped > 0 {
            warn!("sysex longer than {MAX_FRAME_BYTES} bytes, dropped {dropped} bytes");
        }

        // Text side channel: a completed FF 00 00 frame is followed by one
        // length byte and that many bytes of message text.
        if self.buf == [0xFF, 0x00, 0x00] {
            let text = read_text(src, &mut consumed)?;
            return Ok((WireFrame::Text(text), consumed));
        }

        Ok((self.classify(), consumed))
    }

    fn classify(&self) -> WireFrame {
        let status = self.buf[0];
        match status {
            0x80..=0xEF => {
                let (data, len) = self.data_bytes();
                WireFrame::ChannelVoice { status, data, len }
            }
            0xF0 => WireFrame::SysEx(self.buf.clone()),
            0xF1 | 0xF2 | 0xF3 | 0xF6 => {
                let (data, len) = self.data_bytes();
                WireFrame::SystemCommon { status, data, len }
            }
            0xF8 | 0xFA | 0xFB | 0xFC | 0xFE => WireFrame::SystemRealtime { status },
            _ => WireFrame::Unknown { status },
        }
    }

    fn data_bytes(&self) -> ([u8; 2], u8) {
        let mut data = [0u8; 2];
        let len = self.buf.len() - 1;
        data[..len].copy_from_slice(&self.buf[1..]);
        (data, len as u8)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// The bytes have already been transmitted by the peer, so the text is
/// always consumed, even when nobody will look at it.
fn read_text<R: Read>(src: &mut R, consumed: &mut usize) -> io::Result<Vec<u8>> {
    let len = (read_byte(src)? as usize).min(MAX_FRAME_BYTES - 1);
    *consumed += 1;
    let mut text = vec![0u8; len];
    src.read_exact(&mut text)?;
    *consumed += len;
    Ok(text)
}

fn read_byte<R: Read>(src: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    src.read_exact(&mut byte)?;
    Ok(byte[0])
}
