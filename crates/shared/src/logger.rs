use std::{fs::create_dir_all, io, path::Path};

use thiserror::Error;
use tracing::{Level, subscriber::set_global_default};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{layer::SubscriberExt, registry};

/// The number of daily log files kept before the oldest is removed.
const MAX_LOG_FILES: usize = 90;

/// Create and set the global loggers, writing log files named `{file_prefix}.{date}.log` to
/// `./logs`.
pub fn init_logger(file_prefix: &str) -> Result<Vec<WorkerGuard>, LoggerError> {
    init_logger_in("./logs", file_prefix)
}

/// Create and set the global loggers, writing log files named `{file_prefix}.{date}.log` to
/// `directory`.
///
/// The returned guards must be held for the lifetime of the program, dropping them flushes and
/// stops the non-blocking writers.
pub fn init_logger_in<P: AsRef<Path>>(
    directory: P,
    file_prefix: &str,
) -> Result<Vec<WorkerGuard>, LoggerError> {
    let directory = directory.as_ref();
    create_dir_all(directory).map_err(LoggerError::CreateDirectory)?;

    let filter = tracing_subscriber::filter::Targets::new().with_default(Level::INFO);

    // File layer
    let (file_guard, file_layer) = {
        let appender = RollingFileAppender::builder()
            .filename_prefix(file_prefix)
            .filename_suffix("log")
            .rotation(Rotation::DAILY)
            .max_log_files(MAX_LOG_FILES)
            .build(directory)?;

        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false);

        (guard, layer)
    };

    // Std layer
    let (std_guard, std_layer) = {
        let (writer, guard) = tracing_appender::non_blocking(io::stdout());

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(true)
            .with_target(false);

        (guard, layer)
    };

    // Create registry
    let registry = registry().with(file_layer).with(std_layer).with(filter);

    // Set global subscriber
    set_global_default(registry)?;

    Ok(vec![file_guard, std_guard])
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create rolling appender:\n{0}")]
    CreateRollingAppender(#[from] tracing_appender::rolling::InitError),

    #[error("Failed to create log directory:\n{0}")]
    CreateDirectory(#[source] io::Error),

    #[error("Failed to set the global subscriber:\n{0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}
