//! Audit logger for pipeline outcomes

use crate::pipeline::config::AuditConfig;
use crate::pipeline::models::{PipelineOutcome, ResolvedRedaction, TextSpan};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    original_hash: &'a str,
    degradation_level: &'static str,
    fault: Option<&'static str>,
    pii_mode: &'static str,
    pipeline_version: &'a str,
    removed_sections_count: usize,
    redactions_count: usize,
    duration_ms: u64,
    redactions: Vec<AuditRedaction<'a>>,
}

/// Audit redaction entry
#[derive(Debug, Serialize)]
struct AuditRedaction<'a> {
    pii_type: &'static str,
    method: &'static str,
    span: TextSpan,
    confidence: f32,
    content_hash: &'a str,
}

/// Audit logger for pipeline outcomes
///
/// Writes are serialized through a mutex so that concurrent callers never
/// interleave lines.
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            write_lock: Mutex::new(()),
        })
    }

    /// Create a logger from configuration
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append one outcome
    pub fn log_outcome(&self, outcome: &PipelineOutcome) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: outcome.processed_at.to_rfc3339(),
            original_hash: &outcome.original_hash,
            degradation_level: outcome.degradation_level.label(),
            fault: outcome.fault.map(|f| f.label()),
            pii_mode: outcome.pii_mode.label(),
            pipeline_version: &outcome.pipeline_version.engine,
            removed_sections_count: outcome.removed_sections.len(),
            redactions_count: outcome.redactions.len(),
            duration_ms: outcome.duration_ms,
            redactions: outcome.redactions.iter().map(audit_redaction).collect(),
        };

        self.write_entry(&entry)
    }

    fn write_entry(&self, entry: &AuditLogEntry<'_>) -> Result<()> {
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Input: {} | Level: {} | Fault: {} | Sections: {} | Redactions: {} | Time: {}ms",
                entry.timestamp,
                entry.original_hash,
                entry.degradation_level,
                entry.fault.unwrap_or("none"),
                entry.removed_sections_count,
                entry.redactions_count,
                entry.duration_ms
            )
        };

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Audit log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        writeln!(file, "{line}").context("Failed to write audit entry")?;
        Ok(())
    }
}

fn audit_redaction(redaction: &ResolvedRedaction) -> AuditRedaction<'_> {
    AuditRedaction {
        pii_type: redaction.pii_type.label(),
        method: redaction.detection_method.label(),
        span: redaction.span,
        confidence: redaction.confidence,
        content_hash: &redaction.content_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FaultCategory;
    use crate::pipeline::models::{
        CandidateRedaction, DegradationLevel, DetectionMethod, PiiMode, PiiType, PipelineVersion,
        RemovedSection, SectionCategory,
    };
    use chrono::Utc;
    use tempfile::tempdir;

    fn outcome() -> PipelineOutcome {
        PipelineOutcome {
            text: "Scrivi a [PII_EMAIL]".to_string(),
            redactions: vec![CandidateRedaction {
                span: TextSpan::new(9, 32),
                pii_type: PiiType::Email,
                detection_method: DetectionMethod::Structured,
                confidence: 0.95,
                content_hash: "a1b2c3d4e5f60718".to_string(),
            }],
            removed_sections: vec![RemovedSection {
                span: TextSpan::new(0, 14),
                category: SectionCategory::Quote,
                pattern: "quote_standard".to_string(),
                preview: "> mario.rossi@example.com".to_string(),
                confidence: 1.0,
            }],
            degradation_level: DegradationLevel::PiiStructuredOnly,
            fault: Some(FaultCategory::RecognizerUnavailable),
            pii_mode: PiiMode::Redact,
            original_hash: "f".repeat(64),
            pipeline_version: PipelineVersion::new("1.3.0"),
            processed_at: Utc::now(),
            duration_ms: 3,
        }
    }

    #[test]
    fn test_json_entry_has_no_content() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit").join("outcomes.log");
        let logger = AuditLogger::new(log_path.clone(), true, true).unwrap();

        logger.log_outcome(&outcome()).unwrap();
        logger.log_outcome(&outcome()).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["degradation_level"], "PII_STRUCTURED_ONLY");
        assert_eq!(first["fault"], "recognizer_unavailable");
        assert_eq!(first["redactions"][0]["content_hash"], "a1b2c3d4e5f60718");
        assert_eq!(first["redactions"][0]["method"], "STRUCTURED");
        assert!(!content.contains("mario.rossi"));
        assert!(!content.contains("Scrivi"));
    }

    #[test]
    fn test_plain_text_entry() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("outcomes.log");
        let logger = AuditLogger::new(log_path.clone(), false, true).unwrap();

        logger.log_outcome(&outcome()).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Level: PII_STRUCTURED_ONLY"));
        assert!(content.contains("Redactions: 1"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("outcomes.log");
        let logger = AuditLogger::new(log_path.clone(), true, false).unwrap();

        logger.log_outcome(&outcome()).unwrap();
        assert!(!log_path.exists());
    }
}
