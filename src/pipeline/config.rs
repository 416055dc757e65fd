//! Pipeline configuration

use crate::config::{pii_key, validate_pii_key, PiiKey};
use crate::pipeline::canonicalizer::CanonicalizerOptions;
use crate::pipeline::detector::EntityAdapterOptions;
use crate::pipeline::models::PiiMode;
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Accepted matcher budget range in milliseconds
pub const MATCHER_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=10_000;
/// Accepted recognizer timeout range in milliseconds
pub const RECOGNIZER_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=60_000;
/// Accepted recognizer input limit range in bytes
pub const ENTITY_INPUT_RANGE_BYTES: std::ops::RangeInclusive<usize> = 100 * 1024..=5 * 1024 * 1024;

/// Engine configuration, the `[pipeline]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Key for redaction content hashes. Mandatory, no default.
    #[serde(default, skip_serializing)]
    pub pii_key: Option<PiiKey>,

    #[serde(default)]
    pub pii_mode: PiiMode,

    /// Strip quotes, reply headers and forward markers
    #[serde(default = "default_true")]
    pub remove_quotes: bool,

    /// Strip signatures, disclaimers and closings
    #[serde(default = "default_true")]
    pub remove_signatures: bool,

    /// Minimum recognizer score for entity candidates
    #[serde(default = "default_entity_confidence_threshold")]
    pub entity_confidence_threshold: f32,

    /// Wall-clock budget per pattern
    #[serde(default = "default_matcher_timeout_ms")]
    pub matcher_timeout_ms: u64,

    #[serde(default = "default_recognizer_timeout_ms")]
    pub recognizer_timeout_ms: u64,

    /// Recognizer input is truncated beyond this many bytes
    #[serde(default = "default_max_entity_input_bytes")]
    pub max_entity_input_bytes: usize,

    /// Excerpt length at the MINIMAL level
    #[serde(default = "default_minimal_excerpt_chars")]
    pub minimal_excerpt_chars: usize,

    /// Custom pattern library replacing the embedded one
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pii_key: None,
            pii_mode: PiiMode::default(),
            remove_quotes: true,
            remove_signatures: true,
            entity_confidence_threshold: default_entity_confidence_threshold(),
            matcher_timeout_ms: default_matcher_timeout_ms(),
            recognizer_timeout_ms: default_recognizer_timeout_ms(),
            max_entity_input_bytes: default_max_entity_input_bytes(),
            minimal_excerpt_chars: default_minimal_excerpt_chars(),
            pattern_library: None,
            audit: AuditConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults plus a hashing key
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            pii_key: Some(pii_key(key.into())),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match &self.pii_key {
            None => anyhow::bail!("pipeline.pii_key is required"),
            Some(key) => validate_pii_key(key.expose_secret().as_ref())
                .map_err(|e| anyhow::anyhow!("pipeline.{e}"))?,
        }

        if !(0.0..=1.0).contains(&self.entity_confidence_threshold) {
            anyhow::bail!(
                "pipeline.entity_confidence_threshold must be within [0, 1], got {}",
                self.entity_confidence_threshold
            );
        }
        if !MATCHER_TIMEOUT_RANGE_MS.contains(&self.matcher_timeout_ms) {
            anyhow::bail!(
                "pipeline.matcher_timeout_ms must be within {}..={}, got {}",
                MATCHER_TIMEOUT_RANGE_MS.start(),
                MATCHER_TIMEOUT_RANGE_MS.end(),
                self.matcher_timeout_ms
            );
        }
        if !RECOGNIZER_TIMEOUT_RANGE_MS.contains(&self.recognizer_timeout_ms) {
            anyhow::bail!(
                "pipeline.recognizer_timeout_ms must be within {}..={}, got {}",
                RECOGNIZER_TIMEOUT_RANGE_MS.start(),
                RECOGNIZER_TIMEOUT_RANGE_MS.end(),
                self.recognizer_timeout_ms
            );
        }
        if !ENTITY_INPUT_RANGE_BYTES.contains(&self.max_entity_input_bytes) {
            anyhow::bail!(
                "pipeline.max_entity_input_bytes must be within {}..={}, got {}",
                ENTITY_INPUT_RANGE_BYTES.start(),
                ENTITY_INPUT_RANGE_BYTES.end(),
                self.max_entity_input_bytes
            );
        }
        if self.minimal_excerpt_chars == 0 {
            anyhow::bail!("pipeline.minimal_excerpt_chars must be > 0");
        }

        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }

        self.audit.validate().context("Invalid audit configuration")?;

        Ok(())
    }

    /// Apply `MAILPREP_PIPELINE_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_PII_KEY") {
            self.pii_key = Some(pii_key(val));
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_PII_MODE") {
            self.pii_mode = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid MAILPREP_PIPELINE_PII_MODE: {e}"))?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_REMOVE_QUOTES") {
            self.remove_quotes = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_REMOVE_QUOTES value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_REMOVE_SIGNATURES") {
            self.remove_signatures = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_REMOVE_SIGNATURES value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_ENTITY_CONFIDENCE_THRESHOLD") {
            self.entity_confidence_threshold = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_ENTITY_CONFIDENCE_THRESHOLD value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_MATCHER_TIMEOUT_MS") {
            self.matcher_timeout_ms = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_MATCHER_TIMEOUT_MS value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_RECOGNIZER_TIMEOUT_MS") {
            self.recognizer_timeout_ms = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_RECOGNIZER_TIMEOUT_MS value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_MAX_ENTITY_INPUT_BYTES") {
            self.max_entity_input_bytes = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_MAX_ENTITY_INPUT_BYTES value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        self.audit.apply_env_overrides()?;

        Ok(())
    }

    pub fn matcher_budget(&self) -> Duration {
        Duration::from_millis(self.matcher_timeout_ms)
    }

    pub fn canonicalizer_options(&self) -> CanonicalizerOptions {
        CanonicalizerOptions {
            remove_quotes: self.remove_quotes,
            remove_signatures: self.remove_signatures,
        }
    }

    pub fn entity_options(&self) -> EntityAdapterOptions {
        EntityAdapterOptions {
            threshold: self.entity_confidence_threshold,
            max_input_bytes: self.max_entity_input_bytes,
            timeout: Duration::from_millis(self.recognizer_timeout_ms),
        }
    }
}

/// Audit logging configuration, the `[pipeline.audit]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// One JSON object per line instead of plain text
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            anyhow::bail!("pipeline.audit.log_path cannot be empty when audit is enabled");
        }
        Ok(())
    }

    /// Apply `MAILPREP_PIPELINE_AUDIT_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_AUDIT_ENABLED value")?;
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("MAILPREP_PIPELINE_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid MAILPREP_PIPELINE_AUDIT_JSON_FORMAT value")?;
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_entity_confidence_threshold() -> f32 {
    0.75
}

fn default_matcher_timeout_ms() -> u64 {
    1_000
}

fn default_recognizer_timeout_ms() -> u64 {
    2_000
}

fn default_max_entity_input_bytes() -> usize {
    500_000
}

fn default_minimal_excerpt_chars() -> usize {
    500
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/mailprep-audit.log")
}
