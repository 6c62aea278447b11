//! Tracing subscriber setup: console output plus optional daily rolling log files.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "player-store.log";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Emit JSON lines on the console instead of the human-readable format.
    pub json: bool,
    pub log_dir: Option<PathBuf>,
}

/// Installs the global subscriber. Filtering comes from `RUST_LOG` (default `info`).
///
/// Keep the returned guard alive for the lifetime of the process, otherwise
/// buffered file output is lost.
pub fn init(options: &LogOptions) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if options.json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).compact().boxed()
    };

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    // try_init: a second call (e.g. from tests) must not panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    guard
}
