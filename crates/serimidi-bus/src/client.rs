//! Virtual sequencer client: one emitting port, one receiving port.
//!
//! The two halves are handed to the two bridge directions separately, so
//! neither direction ever touches the other's state.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use midir::os::unix::{VirtualInput, VirtualOutput};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use serimidi_wire::BusEvent;
use tracing::warn;

use crate::error::Result;

/// Pending events buffered between the sequencer callback and the consuming
/// direction.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Emit side: publishes events onto the "MIDI out" port.
pub struct BusPublisher {
    conn: MidiOutputConnection,
}

impl BusPublisher {
    /// Publish one event. The sequencer delivers it to subscribers as part
    /// of the send, so nothing is left buffered on this side.
    pub fn publish(&mut self, event: &BusEvent) -> Result<()> {
        self.conn.send(&event.to_bytes())?;
        Ok(())
    }
}

/// Receive side: events written by other clients to the "MIDI in" port.
pub struct BusSubscriber {
    events: Receiver<BusEvent>,
    // Dropping the connection closes the port.
    _conn: MidiInputConnection<Sender<BusEvent>>,
}

impl BusSubscriber {
    /// Wait up to `timeout` for a pending event.
    ///
    /// Returns `None` on timeout so the caller can observe shutdown between
    /// waits.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BusEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Drain everything pending right now without blocking.
    pub fn drain(&self) -> impl Iterator<Item = BusEvent> + '_ {
        self.events.try_iter()
    }
}

/// Open the sequencer client `name` with its two ports.
pub fn open(name: &str) -> Result<(BusPublisher, BusSubscriber)> {
    let output = MidiOutput::new(name)?;
    let out_conn = output.create_virtual("MIDI out")?;

    let mut input = MidiInput::new(name)?;
    // The sequencer filters sysex out by default; the bridge forwards it.
    input.ignore(Ignore::None);

    let (tx, rx) = bounded(EVENT_QUEUE_CAPACITY);
    let in_conn = input.create_virtual(
        "MIDI in",
        move |_timestamp, bytes, tx: &mut Sender<BusEvent>| match BusEvent::from_bytes(bytes) {
            Ok(event) => {
                if tx.try_send(event).is_err() {
                    warn!("bus input queue full, dropping event");
                }
            }
            Err(e) => warn!("bus     {e}"),
        },
        tx,
    )?;

    Ok((
        BusPublisher { conn: out_conn },
        BusSubscriber {
            events: rx,
            _conn: in_conn,
        },
    ))
}
