//!
//! src/logging.rs  Andrew Belles  Oct 19th, 2026
//!
//! Initializes logger. Events go to stderr so that stdout
//! only ever carries the prompt and the report
//!
//!

use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tracing_error::ErrorLayer;
use tracing_appender::non_blocking;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::StatsError;

/// Keeps the background writer alive; dropping it flushes pending events
pub struct LoggingGuard(#[allow(dead_code)] tracing_appender::non_blocking::WorkerGuard);

fn env_filter(cfg: &LoggingConfig) -> Result<EnvFilter, StatsError> {
    let directives = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| cfg.filter_directives.clone());

    EnvFilter::try_new(&directives)
        .map_err(|e| StatsError::Config(format!("invalid log filter {directives:?}: {e}")))
}

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard, StatsError> {
    let (writer, guard) = non_blocking(std::io::stderr());
    let filter = env_filter(cfg)?;
    let time = fmt::time::UtcTime::rfc_3339();

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let installed = match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(layer).try_init()
        },
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_ansi(cfg.with_ansi)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line)
                .compact();
            registry.with(layer).try_init()
        }
    };

    installed.map_err(|e| StatsError::Config(format!("install subscriber: {e}")))?;
    Ok( LoggingGuard(guard) )
}
