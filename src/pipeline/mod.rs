//! Canonicalization and PII redaction pipeline
//!
//! # Architecture
//!
//! ```text
//! raw text ─► Canonicalizer ─► canonical text + removed sections
//!                 │
//!                 ├─► Structured detector ─┐
//!                 └─► Entity adapter ──────┴─► Span resolver ─► Redactor ─► outcome
//! ```
//!
//! The [`PipelineEngine`] runs the chain under a four-level degradation
//! ladder (FULL, PII_STRUCTURED_ONLY, NO_CANONICALIZATION, MINIMAL) and
//! always returns a [`PipelineOutcome`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use mailprep::pipeline::{PipelineConfig, PipelineEngine};
//!
//! # async fn example() -> mailprep::domain::Result<()> {
//! let config = PipelineConfig::with_key("Zq8vN2mR7tLw4xKc");
//! let engine = PipelineEngine::new(&config)?;
//! let outcome = engine.process("Scrivimi a mario.rossi@example.com").await;
//! assert_eq!(outcome.text, "Scrivimi a [PII_EMAIL]");
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod canonicalizer;
pub mod config;
pub mod degradation;
pub mod detector;
pub mod engine;
pub mod hashing;
pub mod headers;
pub mod matcher;
pub mod models;
pub mod patterns;
pub mod redactor;
pub mod report;
pub mod resolver;

pub use canonicalizer::{canonicalize_subject, Canonicalized, TextCanonicalizer};
pub use config::{AuditConfig, PipelineConfig};
pub use detector::{EntityRecognizer, RecognizedEntity, RecognizerError};
pub use engine::PipelineEngine;
pub use headers::REDACTION_FAILED;
pub use models::{
    CandidateRedaction, DegradationLevel, DetectionMethod, PiiMode, PiiType, PipelineOutcome,
    PipelineVersion, RemovedSection, ResolvedRedaction, SectionCategory, TextSpan,
};
pub use patterns::PatternLibrary;
pub use report::{BatchReport, OutcomeMetrics};
