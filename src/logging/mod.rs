//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON-formatted local log files with rotation
//! - `RUST_LOG` overrides
//!
//! # Example
//!
//! ```no_run
//! use folio::logging::init_logging;
//! use folio::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline phase
///
/// # Example
///
/// ```no_run
/// use folio::log_phase_start;
///
/// log_phase_start!("staging load", "/tmp/folio-20240101000000-abc");
/// ```
#[macro_export]
macro_rules! log_phase_start {
    ($phase:expr, $path:expr) => {
        tracing::info!(
            phase = $phase,
            path = %$path,
            "Starting phase"
        );
    };
}

/// Log the completion of a pipeline phase
///
/// # Example
///
/// ```no_run
/// use folio::log_phase_complete;
/// use std::time::Duration;
///
/// log_phase_complete!("batch write", 42_000u64, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_phase_complete {
    ($phase:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            phase = $phase,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Phase completed"
        );
    };
}

/// Log a batch acknowledged by the database sink
///
/// # Example
///
/// ```no_run
/// use folio::log_batch_written;
///
/// log_batch_written!(3u64, 8192usize);
/// ```
#[macro_export]
macro_rules! log_batch_written {
    ($index:expr, $count:expr) => {
        tracing::debug!(
            batch = $index,
            records = $count,
            "Batch written"
        );
    };
}
