//! Domain error types
//!
//! `MailprepError` covers everything that can fail *around* the pipeline
//! (configuration, pattern library loading, I/O). Faults raised *inside* the
//! pipeline are [`PipelineFault`]s: they never reach the caller, the
//! degradation controller turns them into a lower degradation level.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main mailprep error type
#[derive(Debug, Error)]
pub enum MailprepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pattern library could not be read, parsed or compiled
    #[error("Pattern library error: {0}")]
    PatternLibrary(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Fault categories of the pipeline taxonomy
///
/// This is the serializable, content-free view of a [`PipelineFault`] that is
/// attached to outcomes and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// A single pattern exceeded its matching budget
    MatchTimeout,
    /// The external entity recognizer failed, timed out or is not configured
    RecognizerUnavailable,
    /// Section removal failed
    CanonicalizationFault,
    /// Anything else, including input that is not valid text
    UnrecoverableFault,
}

impl FaultCategory {
    /// Stable label used in logs and audit entries
    pub fn label(&self) -> &'static str {
        match self {
            Self::MatchTimeout => "match_timeout",
            Self::RecognizerUnavailable => "recognizer_unavailable",
            Self::CanonicalizationFault => "canonicalization_fault",
            Self::UnrecoverableFault => "unrecoverable_fault",
        }
    }
}

impl std::fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Faults raised by pipeline components
///
/// Messages must never carry message content, only sizes, pattern names and
/// causes.
#[derive(Debug, Clone, Error)]
pub enum PipelineFault {
    /// A pattern exceeded its wall-clock budget
    #[error("pattern '{pattern}' exceeded its {budget_ms}ms matching budget")]
    MatchTimeout { pattern: String, budget_ms: u64 },

    /// The entity recognizer is unavailable or failed
    #[error("entity recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    /// Canonicalization failed
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// Unrecoverable fault
    #[error("unrecoverable fault: {0}")]
    Unrecoverable(String),
}

impl PipelineFault {
    /// Category of this fault
    pub fn category(&self) -> FaultCategory {
        match self {
            Self::MatchTimeout { .. } => FaultCategory::MatchTimeout,
            Self::RecognizerUnavailable(_) => FaultCategory::RecognizerUnavailable,
            Self::Canonicalization(_) => FaultCategory::CanonicalizationFault,
            Self::Unrecoverable(_) => FaultCategory::UnrecoverableFault,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for MailprepError {
    fn from(err: std::io::Error) -> Self {
        MailprepError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MailprepError {
    fn from(err: serde_json::Error) -> Self {
        MailprepError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MailprepError {
    fn from(err: toml::de::Error) -> Self {
        MailprepError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailprep_error_display() {
        let err = MailprepError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_fault_categories() {
        let timeout = PipelineFault::MatchTimeout {
            pattern: "quote_standard".to_string(),
            budget_ms: 1000,
        };
        assert_eq!(timeout.category(), FaultCategory::MatchTimeout);
        assert_eq!(
            PipelineFault::RecognizerUnavailable("down".to_string()).category(),
            FaultCategory::RecognizerUnavailable
        );
        assert_eq!(
            PipelineFault::Canonicalization("boom".to_string()).category(),
            FaultCategory::CanonicalizationFault
        );
        assert_eq!(
            PipelineFault::Unrecoverable("boom".to_string()).category(),
            FaultCategory::UnrecoverableFault
        );
    }

    #[test]
    fn test_fault_category_serializes_snake_case() {
        let json = serde_json::to_string(&FaultCategory::RecognizerUnavailable).unwrap();
        assert_eq!(json, "\"recognizer_unavailable\"");
        assert_eq!(FaultCategory::MatchTimeout.to_string(), "match_timeout");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: MailprepError = io_err.into();
        assert!(matches!(err, MailprepError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: MailprepError = toml_err.into();
        assert!(matches!(err, MailprepError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = MailprepError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let fault = PipelineFault::Unrecoverable("Test".to_string());
        let _: &dyn std::error::Error = &fault;
    }
}
