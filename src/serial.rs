//! Serial transport capability.
//!
//! The port runs raw 8-N-1 with no flow control and single-byte read
//! granularity, which is what microcontroller MIDI firmware speaks.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::Result;

/// Poll granularity for blocking reads; bounds how long a blocked read can
/// outlive a shutdown request.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    shutdown: Arc<AtomicBool>,
}

impl SerialTransport {
    /// Open `device` raw at `baud`, dropping anything stale in the input
    /// queue.
    pub fn open(device: &str, baud: u32, shutdown: Arc<AtomicBool>) -> Result<Self> {
        let port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        port.clear(ClearBuffer::Input)?;
        Ok(Self { port, shutdown })
    }

    /// Second handle over the same descriptor for the write direction.
    /// Reads and writes are independent queues on the device, so the two
    /// directions never contend.
    pub fn writer(&self) -> Result<SerialTransport> {
        Ok(SerialTransport {
            port: self.port.try_clone()?,
            shutdown: Arc::clone(&self.shutdown),
        })
    }
}

impl Read for SerialTransport {
    /// Blocking read that still honors shutdown: timeouts are retried until
    /// a byte arrives or the flag is raised, which surfaces as an error the
    /// owning direction treats as its exit.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "shutting down",
                ));
            }
            match self.port.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    /// Blocks until queued output has physically left the device.
    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
