/*!
 * Logging Module
 * Subscriber setup and request logging middleware
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use config::{LogFormat, LogSettings};

/// Background writer guards; dropping them flushes and stops the log writers.
#[must_use = "dropping the guards stops the log writers"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Initialize the logging system
pub fn init(settings: &LogSettings) -> LogGuards {
    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&settings.directory).ok();

    // File appender for all logs
    let file_appender = rolling::daily(&settings.directory, "app.log");
    let (file_writer, file_guard) = non_blocking(file_appender);

    // File appender for errors only
    let error_appender = rolling::daily(&settings.directory, "error.log");
    let (error_writer, error_guard) = non_blocking(error_appender);

    // Console writer
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_directives()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match settings.format {
        LogFormat::Json => {
            let file_layer = fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            let error_layer = fmt::layer()
                .json()
                .with_writer(error_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

            let console_layer = fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_target(false);

            subscriber
                .with(file_layer)
                .with(error_layer)
                .with(console_layer)
                .init();
        }
        LogFormat::Pretty => {
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);

            let error_layer = fmt::layer()
                .with_writer(error_writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

            let console_layer = fmt::layer()
                .with_writer(console_writer)
                .with_target(true)
                .pretty();

            subscriber
                .with(file_layer)
                .with(error_layer)
                .with(console_layer)
                .init();
        }
    }

    tracing::info!(
        environment = %settings.environment,
        format = %settings.format,
        "logging initialized"
    );

    LogGuards {
        _guards: vec![file_guard, error_guard, console_guard],
    }
}
