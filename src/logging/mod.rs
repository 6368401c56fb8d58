//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Text or JSON console output
//! - Configurable log levels, overridable with `RUST_LOG`
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use octograph::logging::init_logging;
//! use octograph::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the outcome of one stream in one cycle
///
/// Emits exactly one line per call: info for written/skipped/no-data
/// outcomes, error for failures.
///
/// # Example
///
/// ```no_run
/// use octograph::log_stream_outcome;
/// use octograph::core::scheduler::StreamOutcome;
/// use octograph::domain::StreamId;
///
/// let stream_id = StreamId::new("electricity-1200012345678").unwrap();
/// let outcome = StreamOutcome::NoData;
/// log_stream_outcome!(&stream_id, &outcome, None::<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>);
/// ```
#[macro_export]
macro_rules! log_stream_outcome {
    ($stream_id:expr, $outcome:expr, $window:expr) => {{
        let window = $window;
        let window_start = window.map(|(start, _)| start.to_rfc3339());
        let window_end = window.map(|(_, end)| end.to_rfc3339());
        match $outcome {
            $crate::core::scheduler::StreamOutcome::Failed { kind, message } => {
                tracing::error!(
                    stream_id = %$stream_id,
                    outcome = "failed",
                    error_kind = %kind,
                    error = %message,
                    window_start = ?window_start,
                    window_end = ?window_end,
                    "Stream cycle failed"
                );
            }
            other => {
                tracing::info!(
                    stream_id = %$stream_id,
                    outcome = other.label(),
                    points_written = other.points_written(),
                    duplicates = other.duplicates_collapsed(),
                    window_start = ?window_start,
                    window_end = ?window_end,
                    "Stream cycle finished"
                );
            }
        }
    }};
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use octograph::log_retry_attempt;
/// use octograph::domain::ProviderError;
/// use std::time::Duration;
///
/// let err = ProviderError::Timeout("30s".to_string());
/// log_retry_attempt!("fetch", 1, 4, Duration::from_secs(1), &err);
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay.as_millis() as u64,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
