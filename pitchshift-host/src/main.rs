//! `pitchshift`: drive the voice effects engine from the host.
//!
//! Reads a microphone stand-in (WAV file or sine tone), runs it through the
//! engine block by block, writes the raw little-endian block stream to a file
//! or stdout, and applies command lines from stdin or a script as it goes.
//! Logs go to stderr; set `RUST_LOG=debug` for per-command detail.

mod cli;
mod config;
mod control;
mod error;
mod runner;
mod sink;
mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{HostConfig, Settings};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let settings = Settings::resolve(&cli, file)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let summary = runner::run(&settings, &running)?;
    let stats = summary.stats;
    tracing::info!(
        blocks_processed = stats.blocks_processed,
        blocks_sent = stats.blocks_sent,
        blocks_dropped = stats.blocks_dropped,
        commands_applied = stats.commands_applied,
        commands_rejected = stats.commands_rejected,
        commands_ignored = stats.commands_ignored,
        input_peak = summary.input_peak,
        bytes = summary.bytes_written,
        "{}",
        if summary.interrupted { "interrupted" } else { "done" }
    );
    Ok(())
}
