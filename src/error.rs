//! Error types for the bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bus error: {0}")]
    Bus(#[from] serimidi_bus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
