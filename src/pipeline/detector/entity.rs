//! Entity recognizer seam and adapter
//!
//! The recognizer itself is an external capability injected as a trait
//! object. The adapter bounds its input and runtime and converts its labeled
//! spans into candidates with capped confidence.

use crate::domain::PipelineFault;
use crate::pipeline::hashing::ContentHasher;
use crate::pipeline::models::{
    floor_char_boundary, CandidateRedaction, DetectionMethod, PiiType, TextSpan,
};
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on entity confidence
pub const ENTITY_CONFIDENCE_CAP: f32 = 0.80;

/// Minimum entity length in characters
pub const MIN_ENTITY_CHARS: usize = 3;

/// Default recognizer input limit in bytes
pub const DEFAULT_MAX_ENTITY_INPUT_BYTES: usize = 500_000;

/// Default recognizer timeout
pub const DEFAULT_RECOGNIZER_TIMEOUT: Duration = Duration::from_secs(2);

/// Honorifics and titles that are never names on their own
const TITLE_STOPLIST: &[&str] = &[
    "dr", "dr.", "sig", "sig.", "sig.ra", "sig.na", "dott", "dott.", "dott.ssa", "prof", "prof.",
    "ing", "ing.", "avv", "avv.", "mr", "mr.", "mrs", "mrs.", "ms", "ms.",
];

/// Errors reported by a recognizer implementation
#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("recognizer backend unavailable: {0}")]
    Unavailable(String),

    #[error("recognizer failed: {0}")]
    Failed(String),
}

/// One labeled span produced by a recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    /// Byte offset into the text passed to the recognizer
    pub start: usize,
    pub end: usize,
    /// Recognizer label, e.g. `PER` or `ORG`
    pub label: String,
    pub score: f32,
}

/// External named-entity recognition capability
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Recognize entities in `text`
    async fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "entity_recognizer"
    }
}

/// Adapter settings
#[derive(Debug, Clone, Copy)]
pub struct EntityAdapterOptions {
    /// Minimum recognizer score
    pub threshold: f32,
    pub max_input_bytes: usize,
    pub timeout: Duration,
}

impl Default for EntityAdapterOptions {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            max_input_bytes: DEFAULT_MAX_ENTITY_INPUT_BYTES,
            timeout: DEFAULT_RECOGNIZER_TIMEOUT,
        }
    }
}

/// Converts recognizer output into entity candidates
pub struct EntityAdapter {
    recognizer: Arc<dyn EntityRecognizer>,
    hasher: ContentHasher,
    options: EntityAdapterOptions,
}

impl EntityAdapter {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        hasher: ContentHasher,
        options: EntityAdapterOptions,
    ) -> Self {
        Self {
            recognizer,
            hasher,
            options,
        }
    }

    /// Run the recognizer on `text` and convert its output
    ///
    /// Recognizer errors, panics and timeouts, as well as spans that do not
    /// fit the text, are reported as [`PipelineFault::RecognizerUnavailable`].
    pub async fn detect(&self, text: &str) -> Result<Vec<CandidateRedaction>, PipelineFault> {
        let input = self.bounded_input(text);

        let call = tokio::time::timeout(self.options.timeout, self.recognizer.recognize(input));
        let entities = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(Ok(entities))) => entities,
            Ok(Ok(Err(e))) => return Err(PipelineFault::RecognizerUnavailable(e.to_string())),
            Ok(Err(_)) => {
                return Err(PipelineFault::RecognizerUnavailable(format!(
                    "{} timed out after {}ms",
                    self.recognizer.name(),
                    self.options.timeout.as_millis()
                )))
            }
            Err(_) => {
                return Err(PipelineFault::RecognizerUnavailable(format!(
                    "{} panicked",
                    self.recognizer.name()
                )))
            }
        };

        let total = entities.len();
        let mut candidates = Vec::new();

        for entity in entities {
            let span = TextSpan::new(entity.start, entity.end);
            let Some(matched) = span.slice(input) else {
                return Err(PipelineFault::RecognizerUnavailable(format!(
                    "{} returned span {span} outside a text of {} bytes",
                    self.recognizer.name(),
                    input.len()
                )));
            };

            let Some(pii_type) = map_label(&entity.label) else {
                continue;
            };
            if !entity.score.is_finite() || entity.score < self.options.threshold {
                continue;
            }
            if matched.trim().chars().count() < MIN_ENTITY_CHARS || is_title(matched) {
                continue;
            }

            candidates.push(CandidateRedaction {
                span,
                pii_type,
                detection_method: DetectionMethod::Entity,
                confidence: entity.score.clamp(0.0, ENTITY_CONFIDENCE_CAP),
                content_hash: self.hasher.hash(matched),
            });
        }

        tracing::debug!(
            recognizer = self.recognizer.name(),
            text_len = input.len(),
            count = candidates.len(),
            discarded = total - candidates.len(),
            "Entity detection complete"
        );

        Ok(candidates)
    }

    fn bounded_input<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.options.max_input_bytes {
            return text;
        }
        let cut = floor_char_boundary(text, self.options.max_input_bytes);
        tracing::warn!(
            text_len = text.len(),
            limit = self.options.max_input_bytes,
            "Entity recognizer input truncated"
        );
        &text[..cut]
    }
}

fn map_label(label: &str) -> Option<PiiType> {
    match label.to_uppercase().as_str() {
        "PERSON" | "PER" => Some(PiiType::PersonName),
        "ORG" => Some(PiiType::Organization),
        _ => None,
    }
}

fn is_title(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    TITLE_STOPLIST.contains(&lowered.as_str())
}
