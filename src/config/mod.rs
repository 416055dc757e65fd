//! Configuration management for mailprep.
//!
//! Configuration is read from a TOML file, with `${VAR_NAME}` substitution
//! and `MAILPREP_<SECTION>_<KEY>` environment overrides applied before
//! validation.
//!
//! ```rust,no_run
//! use mailprep::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("mailprep.toml")?;
//! println!("PII mode: {}", config.pipeline.pii_mode.label());
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [pipeline]
//! pii_key = "${MAILPREP_PII_KEY}"
//! pii_mode = "redact"
//! remove_quotes = true
//! remove_signatures = true
//! entity_confidence_threshold = 0.75
//!
//! [pipeline.audit]
//! enabled = true
//! log_path = "./audit/mailprep-audit.log"
//!
//! [logging]
//! local_enabled = false
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_str};
pub use schema::{ApplicationConfig, LoggingConfig, MailprepConfig};
pub use secret::{
    generate_pii_key, pii_key, validate_pii_key, KeyMaterial, PiiKey, MIN_KEY_LENGTH,
};
