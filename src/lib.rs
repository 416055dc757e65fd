// Mailprep - Email Canonicalization and PII Redaction
// Copyright (c) 2025 Mailprep Contributors
// Licensed under the MIT License

//! # Mailprep - Email Canonicalization and PII Redaction
//!
//! Mailprep turns raw email bodies into a deterministic, privacy-safe form
//! before they reach downstream classification.
//!
//! ## Overview
//!
//! - **Canonicalizing** bodies: quoted replies, reply headers, signatures,
//!   disclaimers and forward markers are removed with a versioned pattern
//!   library
//! - **Detecting** PII with structured patterns and an optional pluggable
//!   entity recognizer
//! - **Redacting** resolved spans with typed markers such as `[PII_EMAIL]`
//! - **Degrading** gracefully: a fault never loses the message, the engine
//!   steps down a four-level ladder instead
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`pipeline`] - Canonicalization, detection, resolution, redaction
//! - [`domain`] - Error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailprep::config::load_config;
//! use mailprep::pipeline::PipelineEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("mailprep.toml")?;
//!     let engine = PipelineEngine::new(&config.pipeline)?;
//!
//!     let outcome = engine.process("Contact me at mario.rossi@example.com").await;
//!     assert_eq!(outcome.text, "Contact me at [PII_EMAIL]");
//!     println!("Level: {}", outcome.degradation_level);
//!     Ok(())
//! }
//! ```
//!
//! ## Degradation
//!
//! | Level | Canonicalization | Structured PII | Entity PII |
//! |-------|------------------|----------------|------------|
//! | `FULL` | yes | yes | yes |
//! | `PII_STRUCTURED_ONLY` | yes | yes | no |
//! | `NO_CANONICALIZATION` | no | yes | no |
//! | `MINIMAL` | no | no | no |
//!
//! Outcomes at `NO_CANONICALIZATION` or `MINIMAL` report
//! [`pipeline::PipelineOutcome::requires_review`].
//!
//! ## Error Handling
//!
//! Setup errors use [`domain::MailprepError`]. Processing itself never
//! returns an error; faults are recorded on the outcome instead.
//!
//! ```rust,no_run
//! use mailprep::domain::MailprepError;
//!
//! fn example() -> Result<(), MailprepError> {
//!     let config = mailprep::config::load_config("mailprep.toml")?;
//!     let _engine = mailprep::pipeline::PipelineEngine::new(&config.pipeline)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod pipeline;
