//! Validate config command implementation
//!
//! This module implements the `validate-config` command. The summary never
//! prints the hashing key.

use super::{EXIT_CONFIG_ERROR, EXIT_OK};
use crate::config::{load_config, MailprepConfig};
use crate::pipeline::PatternLibrary;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as its last step
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let library = match &config.pipeline.pattern_library {
            Some(path) => PatternLibrary::from_file(path),
            None => PatternLibrary::embedded(),
        };
        let library = match library {
            Ok(library) => library,
            Err(e) => {
                println!("❌ Pattern library failed to load");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for line in summary(&config, &library) {
            println!("{line}");
        }
        println!();
        Ok(EXIT_OK)
    }
}

fn summary(config: &MailprepConfig, library: &PatternLibrary) -> Vec<String> {
    let pipeline = &config.pipeline;
    vec![
        "Configuration Summary:".to_string(),
        format!("  Log Level: {}", config.application.log_level),
        format!(
            "  PII Key: {}",
            if pipeline.pii_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        ),
        format!("  PII Mode: {}", pipeline.pii_mode.label()),
        format!("  Remove Quotes: {}", pipeline.remove_quotes),
        format!("  Remove Signatures: {}", pipeline.remove_signatures),
        format!(
            "  Entity Confidence Threshold: {:.2}",
            pipeline.entity_confidence_threshold
        ),
        format!("  Matcher Timeout: {}ms", pipeline.matcher_timeout_ms),
        format!("  Recognizer Timeout: {}ms", pipeline.recognizer_timeout_ms),
        format!("  Max Entity Input: {} bytes", pipeline.max_entity_input_bytes),
        format!(
            "  Pattern Library: {} (version {}, {} section, {} PII, {} whitelist patterns)",
            pipeline
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "embedded".to_string()),
            library.version(),
            library.sections().len(),
            library.pii_patterns().len(),
            library.whitelist().len()
        ),
        format!(
            "  Audit Log: {}",
            if pipeline.audit.enabled {
                pipeline.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        ),
        format!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                format!(
                    "{} ({})",
                    config.logging.local_path, config.logging.local_rotation
                )
            } else {
                "disabled".to_string()
            }
        ),
    ]
}
