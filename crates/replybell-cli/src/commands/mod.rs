pub mod config;
pub mod replay;
pub mod resolve;
pub mod watch;

use std::io::Write;
use std::path::Path;

use replybell_core::error::Result;
use replybell_core::{Config, MonitorRecord, Verbosity};
use tracing_subscriber::EnvFilter;

/// Load from `--config` when given, otherwise from the default location
/// (creating it on first run).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured verbosity.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// One JSON object per line on stdout. A closed stdout is an error, not a panic.
pub fn print_record(record: &MonitorRecord) -> Result<()> {
    write_record(&mut std::io::stdout().lock(), record)
}

fn write_record(out: &mut impl Write, record: &MonitorRecord) -> Result<()> {
    let line = serde_json::to_string(record)?;
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}
