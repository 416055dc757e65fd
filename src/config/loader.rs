//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::MailprepConfig;
use crate::domain::errors::MailprepError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`MailprepConfig`]
/// 4. Applies environment variable overrides (`MAILPREP_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`MailprepError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use mailprep::config::load_config;
///
/// let config = load_config("mailprep.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MailprepConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MailprepError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MailprepError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    load_config_str(&contents)
}

/// Same as [`load_config`] on in-memory TOML
pub fn load_config_str(contents: &str) -> Result<MailprepConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: MailprepConfig = toml::from_str(&contents)
        .map_err(|e| MailprepError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        MailprepError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MailprepError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(MailprepError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `MAILPREP_*` prefix
///
/// Variables follow `MAILPREP_<SECTION>_<KEY>`, for example
/// `MAILPREP_APPLICATION_LOG_LEVEL` or `MAILPREP_PIPELINE_PII_KEY`.
fn apply_env_overrides(config: &mut MailprepConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("MAILPREP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Pipeline overrides
    config
        .pipeline
        .apply_env_overrides()
        .map_err(|e| MailprepError::Configuration(format!("{e:#}")))?;

    // Logging overrides
    if let Ok(val) = std::env::var("MAILPREP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().map_err(|_| {
            MailprepError::Configuration(format!(
                "Invalid MAILPREP_LOGGING_LOCAL_ENABLED value: {val}"
            ))
        })?;
    }
    if let Ok(val) = std::env::var("MAILPREP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("MAILPREP_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("MAILPREP_LOADER_TEST_VAR", "substituted");
        let input = "pii_key = \"${MAILPREP_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "pii_key = \"substituted\"");
        std::env::remove_var("MAILPREP_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("MAILPREP_LOADER_MISSING_VAR");
        let input = "pii_key = \"${MAILPREP_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("MAILPREP_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_comments_not_substituted() {
        std::env::remove_var("MAILPREP_LOADER_COMMENTED_VAR");
        let input = "# pii_key = \"${MAILPREP_LOADER_COMMENTED_VAR}\"\nlog_level = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-mailprep.toml");
        assert!(matches!(result, Err(MailprepError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[pipeline]
pii_key = "Zq8vN2mR7tLw4xKc-loader"
remove_signatures = false
matcher_timeout_ms = 500

[pipeline.audit]
enabled = false

[logging]
local_enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert!(!config.pipeline.remove_signatures);
        assert_eq!(config.pipeline.matcher_timeout_ms, 500);
        assert_eq!(
            config
                .pipeline
                .pii_key
                .as_ref()
                .unwrap()
                .expose_secret()
                .as_ref(),
            "Zq8vN2mR7tLw4xKc-loader"
        );
    }

    #[test]
    fn test_load_config_rejects_placeholder_key() {
        let err = load_config_str("[pipeline]\npii_key = \"your-salt-here\"\n").unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }
}
