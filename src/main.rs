//! Binary entry point.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serimidi::{bridge, Config};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

fn main() -> Result<()> {
    let config = Config::parse();

    let level = if config.quiet {
        LevelFilter::OFF
    } else if config.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();

    // Either signal raises the flag once; both directions notice at their
    // next poll point.
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))?;

    if config.printonly {
        info!("print-only mode: echoing serial bytes, nothing else");
    }
    info!(
        "bridging {} at {} baud as sequencer client '{}'",
        config.serialdevice, config.baudrate, config.name
    );

    bridge::run(&config, shutdown)?;

    info!("done");
    Ok(())
}
