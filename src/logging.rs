use std::path::PathBuf;

use tracing_error::ErrorLayer;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::{APP_NAME, AppError};

fn default_log_dir() -> PathBuf {
    let dir = format!("~/.{APP_NAME}/logs");
    PathBuf::from(shellexpand::tilde(&dir).into_owned())
}

/// Filter used when `RUST_LOG` is unset: debug builds log the app at debug, release builds at info.
fn default_directives() -> String {
    let level = if cfg!(debug_assertions) { "debug" } else { "info" };
    format!("warn,{APP_NAME}={level}")
}

/// Initializes logging to a daily rolling file and returns the guard that flushes it on drop.
/// The terminal belongs to the ui, so nothing is logged to stdout.
pub fn initialize(log_dir: Option<PathBuf>) -> Result<tracing_appender::non_blocking::WorkerGuard, AppError> {
    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    let appender = tracing_appender::rolling::daily(log_dir, format!("{APP_NAME}.log"));
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    let timer = time::format_description::parse(
        "[year]-[month padding:zero]-[day padding:zero] [hour]:[minute]:[second]",
    )
    .map_err(|e| AppError::Logging(e.to_string()))?;
    let time_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(time_offset, timer);

    let env_filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(default_directives()));

    let file_subscriber = tracing_subscriber::fmt::layer()
        .compact()
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions))
        .with_target(true)
        .with_timer(timer)
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
