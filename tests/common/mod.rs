//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mailprep::pipeline::canonicalizer::CanonicalizationError;
use mailprep::pipeline::{
    Canonicalized, EntityRecognizer, PipelineConfig, PipelineEngine, RecognizedEntity,
    RecognizerError, TextCanonicalizer,
};
use std::sync::Arc;

pub const TEST_KEY: &str = "Zq8vN2mR7tLw4xKc-integration";

pub fn config() -> PipelineConfig {
    PipelineConfig::with_key(TEST_KEY)
}

/// Engine with the embedded library and no recognizer
pub fn engine() -> PipelineEngine {
    PipelineEngine::new(&config()).unwrap()
}

/// Engine with a recognizer that labels every occurrence of the given names
pub fn engine_with_names(names: &[(&str, &str)]) -> PipelineEngine {
    engine().with_recognizer(Arc::new(NameListRecognizer::new(names)))
}

/// Deterministic recognizer: exact, case-sensitive occurrences of known names
pub struct NameListRecognizer {
    names: Vec<(String, String)>,
    score: f32,
}

impl NameListRecognizer {
    pub fn new(names: &[(&str, &str)]) -> Self {
        Self {
            names: names
                .iter()
                .map(|(name, label)| (name.to_string(), label.to_string()))
                .collect(),
            score: 0.9,
        }
    }
}

#[async_trait]
impl EntityRecognizer for NameListRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
        let mut entities = Vec::new();
        for (name, label) in &self.names {
            for (start, matched) in text.match_indices(name.as_str()) {
                entities.push(RecognizedEntity {
                    start,
                    end: start + matched.len(),
                    label: label.clone(),
                    score: self.score,
                });
            }
        }
        Ok(entities)
    }

    fn name(&self) -> &str {
        "name_list"
    }
}

/// Recognizer whose backend is always down
pub struct UnavailableRecognizer;

#[async_trait]
impl EntityRecognizer for UnavailableRecognizer {
    async fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
        Err(RecognizerError::Unavailable("model not loaded".to_string()))
    }
}

/// Canonicalizer that always fails
pub struct BrokenCanonicalizer;

impl TextCanonicalizer for BrokenCanonicalizer {
    fn canonicalize(&self, _text: &str) -> Result<Canonicalized, CanonicalizationError> {
        Err(CanonicalizationError::Failed("pattern table corrupted".to_string()))
    }
}
