//! Logging and observability
//!
//! Structured logging through `tracing`: a console layer plus an optional
//! JSON rolling-file layer. Pipeline events carry counts, sizes, pattern
//! names and levels only. Message content never reaches a log line.
//!
//! # Example
//!
//! ```no_run
//! use mailprep::logging::init_logging;
//! use mailprep::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(text_len = 1024, "Message received");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a transition down the degradation ladder
///
/// # Example
///
/// ```no_run
/// use mailprep::log_degradation;
/// use mailprep::domain::FaultCategory;
/// use mailprep::pipeline::DegradationLevel;
///
/// log_degradation!(
///     DegradationLevel::Full,
///     DegradationLevel::PiiStructuredOnly,
///     FaultCategory::RecognizerUnavailable
/// );
/// ```
#[macro_export]
macro_rules! log_degradation {
    ($from:expr, $to:expr, $fault:expr) => {
        tracing::warn!(
            from = %$from,
            level = %$to,
            fault = %$fault,
            "Pipeline degraded"
        );
    };
}

/// Log the observability summary of one outcome
///
/// # Example
///
/// ```no_run
/// use mailprep::log_outcome_summary;
/// use mailprep::pipeline::OutcomeMetrics;
///
/// let metrics = OutcomeMetrics::default();
/// log_outcome_summary!(&metrics, 12u64);
/// ```
#[macro_export]
macro_rules! log_outcome_summary {
    ($metrics:expr, $duration_ms:expr) => {
        tracing::info!(
            level = %$metrics.degradation_level,
            removed_sections = $metrics.removed_sections_total(),
            redactions = $metrics.redactions_total(),
            duration_ms = $duration_ms,
            "Pipeline outcome"
        );
    };
}

/// Log a batch progress step
#[macro_export]
macro_rules! log_batch_processing {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}
