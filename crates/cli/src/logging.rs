//! Tracing subscriber setup

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins over `verbosity`. With `log_file` the output goes to that
/// file through a background writer; keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory: {}", directory.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(None)
        }
    }
}
