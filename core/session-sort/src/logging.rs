//! Logging setup for the CLI.
//!
//! Events go to stderr and to a daily rolling file under
//! `<data dir>/session-sort/logs`. `RUST_LOG` selects the level;
//! `SESSION_SORT_DEBUG_LOG=1` or `--verbose` forces `debug`.

use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEBUG_ENV: &str = "SESSION_SORT_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "session-sort.log";

pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("session-sort").join("logs"))
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let filter = build_filter(verbose || debug_enabled());
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match prepare_log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

fn prepare_log_dir() -> Option<PathBuf> {
    let dir = log_dir()?;
    fs_err::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn build_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}
