use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialise logging into `hotklick.log` under `dir`. The terminal belongs
/// to the TUI, so nothing is written to stdout or stderr.
///
/// `RUST_LOG` only overrides the level when debug logging is enabled.
/// Keep the returned guard alive until exit so buffered lines get flushed.
pub fn init(debug: bool, dir: &Path) -> Result<WorkerGuard> {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let appender = tracing_appender::rolling::never(dir, "hotklick.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}
