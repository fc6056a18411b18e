//! Command-line configuration, read-only for the lifetime of the process.

use clap::Parser;

/// Baud rates the serial layer accepts.
const SUPPORTED_BAUD: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Connect serial port MIDI devices to software MIDI ports.
#[derive(Parser, Debug, Clone)]
#[command(name = "serimidi", version, about)]
pub struct Config {
    /// Serial device to use.
    #[arg(short = 's', long, default_value = "/dev/ttyUSB0")]
    pub serialdevice: String,

    /// Serial port baud rate.
    #[arg(short = 'b', long, default_value_t = 115200, value_parser = parse_baud)]
    pub baudrate: u32,

    /// Name of the sequencer client.
    #[arg(short = 'n', long, default_value = "serimidi")]
    pub name: String,

    /// For debugging: produce verbose per-message output.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Super debugging: print bytes read from the serial port and do
    /// nothing else.
    #[arg(short = 'p', long)]
    pub printonly: bool,

    /// Don't produce any output, even when the print command is sent.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

fn parse_baud(arg: &str) -> Result<u32, String> {
    let baud: u32 = arg
        .parse()
        .map_err(|_| format!("invalid baud rate '{arg}'"))?;
    if SUPPORTED_BAUD.contains(&baud) {
        Ok(baud)
    } else {
        Err(format!("baud rate {baud} is not supported"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_baud_parses() {
        for baud in SUPPORTED_BAUD {
            assert_eq!(parse_baud(&baud.to_string()), Ok(baud));
        }
    }

    #[test]
    fn test_midi_din_rate_is_not_a_serial_rate() {
        assert!(parse_baud("31250").is_err());
    }
}
