//! Bridge runtime: the two duplex directions and their shared lifecycle.
//!
//! Direction A (serial → bus) blocks on single-byte serial reads; direction
//! B (bus → serial) waits on the event channel with a bounded timeout. They
//! share nothing but the shutdown flag and the read-only configuration;
//! each owns its buffers and its own handle on the serial descriptor.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serimidi_bus::{BusPublisher, BusSubscriber};
use serimidi_wire::{BusEvent, FrameDecoder, WireFrame};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::serial::SerialTransport;

/// How often the bus direction re-checks the shutdown flag when idle.
const BUS_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Run the bridge until shutdown is requested or a direction fails.
pub fn run(config: &Config, shutdown: Arc<AtomicBool>) -> Result<()> {
    let serial = SerialTransport::open(
        &config.serialdevice,
        config.baudrate,
        Arc::clone(&shutdown),
    )?;
    let writer = serial.writer()?;
    let (publisher, subscriber) = serimidi_bus::open(&config.name)?;

    let reader_thread = thread::Builder::new().name("serial-to-bus".into()).spawn({
        let shutdown = Arc::clone(&shutdown);
        let printonly = config.printonly;
        move || {
            let result = if printonly {
                echo_serial(serial, &shutdown)
            } else {
                forward_serial_to_bus(serial, publisher, &shutdown)
            };
            if let Err(e) = result {
                error!("serial direction failed: {e}");
            }
            // Either direction going down takes the other with it.
            shutdown.store(true, Ordering::SeqCst);
        }
    })?;

    let writer_thread = thread::Builder::new().name("bus-to-serial".into()).spawn({
        let shutdown = Arc::clone(&shutdown);
        move || {
            if let Err(e) = forward_bus_to_serial(writer, subscriber, &shutdown) {
                error!("bus direction failed: {e}");
            }
            shutdown.store(true, Ordering::SeqCst);
        }
    })?;

    if writer_thread.join().is_err() {
        error!("bus-to-serial thread panicked");
    }
    if reader_thread.join().is_err() {
        error!("serial-to-bus thread panicked");
    }
    info!("stopped");
    Ok(())
}

/// Direction A: decode serial bytes into frames and publish them.
fn forward_serial_to_bus(
    mut serial: SerialTransport,
    mut bus: BusPublisher,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    while !shutdown.load(Ordering::Relaxed) {
        let frame = match decoder.read_frame(&mut serial) {
            Ok((frame, _consumed)) => frame,
            Err(_) if shutdown.load(Ordering::Relaxed) => break,
            Err(e) => return Err(e.into()),
        };
        match frame {
            WireFrame::Text(text) => {
                info!(
                    "serial  FF Text len = {:04X}  {}",
                    text.len(),
                    String::from_utf8_lossy(&text)
                );
            }
            WireFrame::Unknown { status } => {
                warn!("serial  {status:02X} Unknown MIDI cmd");
            }
            frame => {
                if let Some(event) = BusEvent::from_frame(frame) {
                    debug!("serial  {event}");
                    bus.publish(&event)?;
                }
            }
        }
    }
    Ok(())
}

/// Direction A in print-only mode: echo every byte, decode nothing.
fn echo_serial(mut serial: SerialTransport, shutdown: &AtomicBool) -> Result<()> {
    let mut byte = [0u8; 1];
    let mut stdout = io::stdout();
    while !shutdown.load(Ordering::Relaxed) {
        match serial.read_exact(&mut byte) {
            Ok(()) => {
                write!(stdout, "{:02X} ", byte[0])?;
                stdout.flush()?;
            }
            Err(_) if shutdown.load(Ordering::Relaxed) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Direction B: drain pending bus events in batches and serialize them.
fn forward_bus_to_serial(
    mut serial: SerialTransport,
    bus: BusSubscriber,
    shutdown: &AtomicBool,
) -> Result<()> {
    while !shutdown.load(Ordering::Relaxed) {
        let Some(first) = bus.recv_timeout(BUS_POLL_TIMEOUT) else {
            continue;
        };
        write_event(&mut serial, &first)?;
        for event in bus.drain() {
            write_event(&mut serial, &event)?;
        }
    }
    Ok(())
}

fn write_event(serial: &mut SerialTransport, event: &BusEvent) -> Result<()> {
    debug!("bus     {event}");
    serial.write_all(&event.to_wire_bytes())?;
    // Sysex can be long; push it onto the line before taking the next
    // event.
    if matches!(event, BusEvent::SysEx(_)) {
        serial.flush()?;
    }
    Ok(())
}
