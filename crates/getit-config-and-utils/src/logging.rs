//! Logging initialization.
//!
//! The server logs to `<store>.log` (or `<store>.debug.log` when `--debug`
//! is set, which also mirrors output to stderr). `--no-log` disables the
//! file layer entirely.

use crate::{CoreResult, Paths};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// The returned guard flushes buffered log lines when dropped; hold it for
/// the lifetime of the process.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error);
///   `RUST_LOG` takes precedence when set.
/// * `paths` - Paths for the active store (determines the log file).
/// * `debug` - Use the debug log file and mirror output to stderr.
/// * `no_log` - Skip the log file entirely.
pub fn init_logging(
    level: &str,
    paths: &Paths,
    debug: bool,
    no_log: bool,
) -> CoreResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if no_log {
        if debug {
            registry.with(fmt::layer().with_writer(std::io::stderr)).init();
        } else {
            registry.init();
        }
        return Ok(None);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.log_file(debug))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

    if debug {
        registry
            .with(file_layer)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(file_layer).init();
    }

    Ok(Some(guard))
}
