//! Init command implementation
//!
//! This module implements the `init` command for generating a starter
//! configuration file with a freshly generated hashing key.

use super::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_OK};
use crate::config::generate_pii_key;
use clap::Args;
use std::fs;
use std::path::Path;

/// Length of generated hashing keys
const GENERATED_KEY_LENGTH: usize = 48;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "mailprep.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing mailprep configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let config_content = Self::generate_config(&generate_pii_key(GENERATED_KEY_LENGTH));

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!(
                    "  1. Keep {} out of version control, it holds the hashing key",
                    self.output
                );
                println!("  2. Validate configuration: mailprep validate-config");
                println!("  3. Process a message: mailprep process --input message.txt");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Starter configuration with comments
    fn generate_config(pii_key: &str) -> String {
        format!(
            r#"# Mailprep Configuration File
# Email canonicalization and PII redaction

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Pipeline Settings
# ============================================================================
[pipeline]
# Key for the keyed content hashes attached to each redaction.
# Changing it breaks correlation with previously produced hashes.
# May also be supplied as "${{MAILPREP_PII_KEY}}" or via MAILPREP_PIPELINE_PII_KEY.
pii_key = "{pii_key}"

# PII handling: redact | detect_only | disabled
pii_mode = "redact"

# Canonicalization
remove_quotes = true
remove_signatures = true

# Minimum recognizer score for person and organization names (0.0-1.0)
entity_confidence_threshold = 0.75

# Per-pattern matching budget in milliseconds (1-10000)
matcher_timeout_ms = 1000

# Recognizer call budget in milliseconds (1-60000)
recognizer_timeout_ms = 2000

# Input longer than this is truncated before entity recognition
max_entity_input_bytes = 500000

# Characters kept when falling back to a raw excerpt
minimal_excerpt_chars = 500

# Optional: replace the embedded pattern library
# pattern_library = "./patterns/custom.toml"

[pipeline.audit]
# Append one entry per processed message (never message content)
enabled = false
log_path = "./audit/mailprep-audit.log"
json_format = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Write JSON logs to rolling files
local_enabled = false
local_path = "./logs"

# Rotation: daily | hourly | never
local_rotation = "daily"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, validate_pii_key};
    use secrecy::ExposeSecret;
    use tempfile::tempdir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "mailprep.toml".to_string(),
            force: false,
        };

        assert_eq!(args.output, "mailprep.toml");
        assert!(!args.force);
    }

    #[test]
    fn test_generate_config_embeds_key() {
        let config = InitArgs::generate_config("Zq8vN2mR7tLw4xKc");
        assert!(config.contains("[pipeline]"));
        assert!(config.contains("pii_key = \"Zq8vN2mR7tLw4xKc\""));
        assert!(config.contains("${MAILPREP_PII_KEY}"));
    }

    #[tokio::test]
    async fn test_execute_writes_loadable_config() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("mailprep.toml");
        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_OK);

        let config = load_config(&output).unwrap();
        let key = config.pipeline.pii_key.as_ref().unwrap();
        assert!(validate_pii_key(key.expose_secret().as_ref()).is_ok());
    }

    #[tokio::test]
    async fn test_execute_refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("mailprep.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG_ERROR);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let forced = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: true,
        };
        assert_eq!(forced.execute().await.unwrap(), EXIT_OK);
    }
}
