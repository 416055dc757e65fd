//! Pipeline engine
//!
//! Drives canonicalization, detection, resolution and redaction under the
//! degradation ladder. Every entry point returns a valid outcome: faults and
//! panics raised by a level are absorbed and the next level is tried.

use crate::config::validate_pii_key;
use crate::domain::{MailprepError, PipelineFault, Result};
use crate::log_batch_processing;
use crate::log_outcome_summary;
use crate::pipeline::audit::AuditLogger;
use crate::pipeline::canonicalizer::{Canonicalized, PatternCanonicalizer, TextCanonicalizer};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::degradation::DegradationController;
use crate::pipeline::detector::{
    EntityAdapter, EntityAdapterOptions, EntityRecognizer, StructuredDetector,
};
use crate::pipeline::hashing::{original_hash, ContentHasher};
use crate::pipeline::matcher::BoundedMatcher;
use crate::pipeline::models::{
    char_prefix, DegradationLevel, PiiMode, PipelineOutcome, PipelineVersion, RemovedSection,
    ResolvedRedaction,
};
use crate::pipeline::patterns::PatternLibrary;
use crate::pipeline::redactor;
use crate::pipeline::report::BatchReport;
use crate::pipeline::resolver;
use chrono::Utc;
use futures::FutureExt;
use secrecy::ExposeSecret;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Text, redactions and removed sections produced by one level
struct LevelOutput {
    text: String,
    redactions: Vec<ResolvedRedaction>,
    removed_sections: Vec<RemovedSection>,
}

/// Canonicalization and PII redaction engine
///
/// Holds only read-only state (compiled library, detectors, settings), so a
/// single engine can be shared behind an `Arc` and called concurrently.
pub struct PipelineEngine {
    library: Arc<PatternLibrary>,
    canonicalizer: Arc<dyn TextCanonicalizer>,
    structured: StructuredDetector,
    entity: Option<EntityAdapter>,
    hasher: ContentHasher,
    entity_options: EntityAdapterOptions,
    pii_mode: PiiMode,
    minimal_excerpt_chars: usize,
    version: PipelineVersion,
    audit: Option<AuditLogger>,
}

impl PipelineEngine {
    /// Build an engine from configuration
    ///
    /// Loads the custom pattern library when one is configured, otherwise the
    /// embedded one.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let library = match &config.pattern_library {
            Some(path) => PatternLibrary::from_file(path)?,
            None => PatternLibrary::embedded()?,
        };
        Self::with_library(config, Arc::new(library))
    }

    /// Build an engine around an already compiled library
    ///
    /// The key is checked the same way the config loader checks it, so empty,
    /// short and placeholder keys are rejected here too.
    pub fn with_library(config: &PipelineConfig, library: Arc<PatternLibrary>) -> Result<Self> {
        let key = config.pii_key.as_ref().ok_or_else(|| {
            MailprepError::Configuration("pipeline.pii_key is required".to_string())
        })?;
        validate_pii_key(key.expose_secret().as_ref())
            .map_err(|e| MailprepError::Configuration(format!("pipeline.{e}")))?;
        let hasher = ContentHasher::new(key)?;
        let matcher = BoundedMatcher::new(config.matcher_budget());

        let canonicalizer = Arc::new(PatternCanonicalizer::new(
            Arc::clone(&library),
            matcher,
            config.canonicalizer_options(),
        ));
        let structured = StructuredDetector::new(Arc::clone(&library), matcher, hasher.clone());

        let audit = if config.audit.enabled {
            let logger = AuditLogger::from_config(&config.audit)
                .map_err(|e| MailprepError::Configuration(format!("{e:#}")))?;
            Some(logger)
        } else {
            None
        };

        tracing::info!(
            pattern_library = library.version(),
            pii_mode = config.pii_mode.label(),
            remove_quotes = config.remove_quotes,
            remove_signatures = config.remove_signatures,
            audit = audit.is_some(),
            "Pipeline engine initialized"
        );

        Ok(Self {
            version: PipelineVersion::new(library.version()),
            library,
            canonicalizer,
            structured,
            entity: None,
            hasher,
            entity_options: config.entity_options(),
            pii_mode: config.pii_mode,
            minimal_excerpt_chars: config.minimal_excerpt_chars,
            audit,
        })
    }

    /// Attach an entity recognizer
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.entity = Some(EntityAdapter::new(
            recognizer,
            self.hasher.clone(),
            self.entity_options,
        ));
        self
    }

    /// Replace the canonicalizer
    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn TextCanonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Shared pattern library
    pub fn library(&self) -> &Arc<PatternLibrary> {
        &self.library
    }

    pub fn version(&self) -> &PipelineVersion {
        &self.version
    }

    pub fn pii_mode(&self) -> PiiMode {
        self.pii_mode
    }

    /// Process one text field
    pub async fn process(&self, text: &str) -> PipelineOutcome {
        let started = Instant::now();
        let mut controller = self.initial_controller();
        let mut canonical: Option<Canonicalized> = None;

        while controller.level() != DegradationLevel::Minimal {
            let level = controller.level();
            let attempt = AssertUnwindSafe(self.run_level(level, text, &mut canonical))
                .catch_unwind()
                .await;

            match attempt {
                Ok(Ok(output)) => {
                    return self.finish(output, &controller, text.as_bytes(), started);
                }
                Ok(Err(fault)) => {
                    controller.degrade(&fault);
                }
                Err(_) => {
                    controller.degrade(&PipelineFault::Unrecoverable(format!(
                        "panic at level {level}"
                    )));
                }
            }
        }

        self.minimal(text, &controller, text.as_bytes(), started)
    }

    /// Process raw bytes; input that is not UTF-8 degrades to MINIMAL
    pub async fn process_bytes(&self, input: &[u8]) -> PipelineOutcome {
        match std::str::from_utf8(input) {
            Ok(text) => self.process(text).await,
            Err(e) => {
                let started = Instant::now();
                let mut controller = DegradationController::default();
                controller.degrade(&PipelineFault::Unrecoverable(format!(
                    "input is not valid UTF-8 after byte {}",
                    e.valid_up_to()
                )));
                let lossy = String::from_utf8_lossy(input);
                self.minimal(&lossy, &controller, input, started)
            }
        }
    }

    /// Process several inputs; outcomes keep input order
    pub async fn process_batch<S: AsRef<str>>(
        &self,
        inputs: &[S],
    ) -> (Vec<PipelineOutcome>, BatchReport) {
        let mut outcomes = Vec::with_capacity(inputs.len());
        let mut report = BatchReport::new();

        for (idx, input) in inputs.iter().enumerate() {
            let outcome = self.process(input.as_ref()).await;
            report.add_outcome(&outcome);
            outcomes.push(outcome);
            log_batch_processing!(idx + 1, inputs.len());
        }

        tracing::info!(
            total = report.total,
            requiring_review = report.requiring_review,
            redactions = report.redactions_total(),
            "Batch processed"
        );

        (outcomes, report)
    }

    fn initial_controller(&self) -> DegradationController {
        if self.entity.is_some() {
            DegradationController::default()
        } else {
            tracing::trace!("No entity recognizer attached, starting structured-only");
            DegradationController::starting_at(DegradationLevel::PiiStructuredOnly)
        }
    }

    async fn run_level(
        &self,
        level: DegradationLevel,
        text: &str,
        canonical: &mut Option<Canonicalized>,
    ) -> std::result::Result<LevelOutput, PipelineFault> {
        match level {
            DegradationLevel::Full | DegradationLevel::PiiStructuredOnly => {
                if canonical.is_none() {
                    *canonical = Some(self.canonicalize(text)?);
                }
                let Some(canonical) = canonical.as_ref() else {
                    return Err(PipelineFault::Unrecoverable(
                        "canonical text missing".to_string(),
                    ));
                };

                let use_entity = level == DegradationLevel::Full;
                let (redacted, redactions) =
                    self.redact_pii(&canonical.text, use_entity).await?;
                Ok(LevelOutput {
                    text: redacted,
                    redactions,
                    removed_sections: canonical.removed_sections.clone(),
                })
            }
            DegradationLevel::NoCanonicalization => {
                let (redacted, redactions) = self.redact_pii(text, false).await?;
                Ok(LevelOutput {
                    text: redacted,
                    redactions,
                    removed_sections: Vec::new(),
                })
            }
            DegradationLevel::Minimal => Err(PipelineFault::Unrecoverable(
                "MINIMAL has no processing stage".to_string(),
            )),
        }
    }

    /// Canonicalizer call with panics contained at the component boundary
    fn canonicalize(&self, text: &str) -> std::result::Result<Canonicalized, PipelineFault> {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.canonicalizer.canonicalize(text)))
            .map_err(|_| PipelineFault::Canonicalization("canonicalizer panicked".to_string()))?
            .map_err(|e| PipelineFault::Canonicalization(e.to_string()))
    }

    /// Detection, resolution and (per PII mode) substitution on one text
    pub(crate) async fn redact_pii(
        &self,
        text: &str,
        use_entity: bool,
    ) -> std::result::Result<(String, Vec<ResolvedRedaction>), PipelineFault> {
        if self.pii_mode == PiiMode::Disabled {
            return Ok((text.to_string(), Vec::new()));
        }

        let mut candidates = self.structured.detect(text);
        if use_entity {
            if let Some(entity) = &self.entity {
                candidates.extend(entity.detect(text).await?);
            }
        }

        let resolved = resolver::merge(candidates);

        match self.pii_mode {
            PiiMode::Redact => {
                let redacted = redactor::apply(text, &resolved)
                    .map_err(|e| PipelineFault::Unrecoverable(e.to_string()))?;
                Ok((redacted, resolved))
            }
            PiiMode::DetectOnly | PiiMode::Disabled => Ok((text.to_string(), resolved)),
        }
    }

    pub(crate) fn has_recognizer(&self) -> bool {
        self.entity.is_some()
    }

    fn finish(
        &self,
        output: LevelOutput,
        controller: &DegradationController,
        raw: &[u8],
        started: Instant,
    ) -> PipelineOutcome {
        let outcome = PipelineOutcome {
            text: output.text,
            redactions: output.redactions,
            removed_sections: output.removed_sections,
            degradation_level: controller.level(),
            fault: controller.fault(),
            pii_mode: self.pii_mode,
            original_hash: original_hash(raw),
            pipeline_version: self.version.clone(),
            processed_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.record(&outcome);
        outcome
    }

    fn minimal(
        &self,
        text: &str,
        controller: &DegradationController,
        raw: &[u8],
        started: Instant,
    ) -> PipelineOutcome {
        let outcome = PipelineOutcome {
            text: char_prefix(text, self.minimal_excerpt_chars).to_string(),
            redactions: Vec::new(),
            removed_sections: Vec::new(),
            degradation_level: DegradationLevel::Minimal,
            fault: controller.fault(),
            pii_mode: self.pii_mode,
            original_hash: original_hash(raw),
            pipeline_version: self.version.clone(),
            processed_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.record(&outcome);
        outcome
    }

    /// Summary log and audit entry; neither can change the outcome
    fn record(&self, outcome: &PipelineOutcome) {
        let metrics = outcome.metrics();
        log_outcome_summary!(metrics, outcome.duration_ms);

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_outcome(outcome) {
                tracing::warn!(error = %e, "Failed to write audit entry");
            }
        }
    }
}
