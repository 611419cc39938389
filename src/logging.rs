//! Log setup: a file under the user's data directory, plus stderr in debug
//! builds. The filter comes from `SONAR_WIDGET_LOG` and defaults to `info`.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::APP_DIR_NAME;

pub const LOG_ENV_VAR: &str = "SONAR_WIDGET_LOG";
const LOG_FILE_NAME: &str = "widget.log";

pub fn get_log_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR_NAME);
    path.push("logs");
    path
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init() -> Option<WorkerGuard> {
    let log_dir = get_log_dir();
    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let stderr_layer = cfg!(debug_assertions).then(|| fmt::layer().with_writer(std::io::stderr));

    let _ = tracing_subscriber::registry()
        .with(file_layer.map(|l| l.with_filter(env_filter())))
        .with(stderr_layer.map(|l| l.with_filter(env_filter())))
        .try_init();

    guard
}
