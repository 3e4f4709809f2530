//! Logging infrastructure for Cutline.
//!
//! This module provides:
//! - Global `tracing` subscriber setup
//! - Per-operation loggers with file + callback output
//! - Tail buffer of ffmpeg output for error diagnosis
//!
//! # Example
//!
//! ```no_run
//! use cutline_core::logging::{LogConfig, OperationLogger};
//!
//! let logger = OperationLogger::new("trim", "/path/to/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Render");
//! logger.success("Done");
//! ```

mod operation_logger;
mod types;

pub use operation_logger::OperationLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Output goes
/// to stderr. Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
