//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use mailprep::config::load_config;
use mailprep::pipeline::{PiiMode, PipelineEngine};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: &[&str] = &[
    "MAILPREP_APPLICATION_LOG_LEVEL",
    "MAILPREP_PIPELINE_PII_KEY",
    "MAILPREP_PIPELINE_PII_MODE",
    "MAILPREP_PIPELINE_REMOVE_QUOTES",
    "MAILPREP_PIPELINE_MATCHER_TIMEOUT_MS",
    "MAILPREP_PIPELINE_AUDIT_ENABLED",
    "MAILPREP_LOGGING_LOCAL_ROTATION",
    "TEST_MAILPREP_KEY",
];

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[pipeline]
pii_key = "Zq8vN2mR7tLw4xKc-complete"
pii_mode = "detect_only"
remove_quotes = true
remove_signatures = false
entity_confidence_threshold = 0.6
matcher_timeout_ms = 250
recognizer_timeout_ms = 1500
max_entity_input_bytes = 200000
minimal_excerpt_chars = 120

[pipeline.audit]
enabled = false
log_path = "./audit/test.log"
json_format = false

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.pipeline.pii_mode, PiiMode::DetectOnly);
    assert!(!config.pipeline.remove_signatures);
    assert!((config.pipeline.entity_confidence_threshold - 0.6).abs() < f32::EPSILON);
    assert_eq!(config.pipeline.matcher_timeout_ms, 250);
    assert_eq!(config.pipeline.recognizer_timeout_ms, 1500);
    assert_eq!(config.pipeline.max_entity_input_bytes, 200_000);
    assert_eq!(config.pipeline.minimal_excerpt_chars, 120);
    assert!(!config.pipeline.audit.json_format);
    assert_eq!(config.logging.local_rotation, "hourly");

    let engine = PipelineEngine::new(&config.pipeline).unwrap();
    assert_eq!(engine.pii_mode(), PiiMode::DetectOnly);
}

#[test]
fn test_key_from_environment_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_MAILPREP_KEY", "Pz3Rt8Wq1Ys6Uv0x-from-env");

    let file = write_config("[pipeline]\npii_key = \"${TEST_MAILPREP_KEY}\"\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config
            .pipeline
            .pii_key
            .as_ref()
            .unwrap()
            .expose_secret()
            .as_ref(),
        "Pz3Rt8Wq1Ys6Uv0x-from-env"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[pipeline]\npii_key = \"${TEST_MAILPREP_KEY}\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_MAILPREP_KEY"));
}

#[test]
fn test_environment_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("MAILPREP_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("MAILPREP_PIPELINE_PII_KEY", "Pz3Rt8Wq1Ys6Uv0x-override");
    std::env::set_var("MAILPREP_PIPELINE_PII_MODE", "disabled");
    std::env::set_var("MAILPREP_PIPELINE_REMOVE_QUOTES", "false");
    std::env::set_var("MAILPREP_PIPELINE_MATCHER_TIMEOUT_MS", "50");
    std::env::set_var("MAILPREP_LOGGING_LOCAL_ROTATION", "never");

    let file = write_config("[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc-file\"\n");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(
        config
            .pipeline
            .pii_key
            .as_ref()
            .unwrap()
            .expose_secret()
            .as_ref(),
        "Pz3Rt8Wq1Ys6Uv0x-override"
    );
    assert_eq!(config.pipeline.pii_mode, PiiMode::Disabled);
    assert!(!config.pipeline.remove_quotes);
    assert_eq!(config.pipeline.matcher_timeout_ms, 50);
    assert_eq!(config.logging.local_rotation, "never");

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_value() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("MAILPREP_PIPELINE_AUDIT_ENABLED", "sometimes");

    let file = write_config("[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc-file\"\n");
    assert!(load_config(file.path()).is_err());

    cleanup_env_vars();
}

#[test]
fn test_validation_failures() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"loud\"\n[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\n",
        "[pipeline]\n",
        "[pipeline]\npii_key = \"changeme\"\n",
        "[pipeline]\npii_key = \"short\"\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\nentity_confidence_threshold = 1.5\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\nmatcher_timeout_ms = 0\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\nmax_entity_input_bytes = 10\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\npattern_library = \"missing.toml\"\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\npii_mode = \"shred\"\n",
        "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"\n[logging]\nlocal_rotation = \"weekly\"\n",
    ];

    for content in cases {
        let file = write_config(content);
        assert!(load_config(file.path()).is_err(), "accepted: {content}");
    }
}

#[test]
fn test_error_never_echoes_key() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[pipeline]\npii_key = \"tiny-key\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(!err.to_string().contains("tiny-key"));
}

#[test]
fn test_debug_output_redacts_key() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc-debug\"\n");
    let config = load_config(file.path()).unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("Zq8vN2mR7tLw4xKc-debug"));

    let serialized = toml::to_string(&config).unwrap();
    assert!(!serialized.contains("Zq8vN2mR7tLw4xKc-debug"));
}
