//! Pattern-based PII detector

use crate::pipeline::hashing::ContentHasher;
use crate::pipeline::matcher::BoundedMatcher;
use crate::pipeline::models::{CandidateRedaction, DetectionMethod, TextSpan};
use crate::pipeline::patterns::PatternLibrary;
use std::sync::Arc;

/// Confidence assigned to every structured detection
pub const STRUCTURED_CONFIDENCE: f32 = 0.95;

/// Structured PII detector
///
/// Runs every PII pattern of the library under the matcher budget and drops
/// matches that overlap a whitelist match.
pub struct StructuredDetector {
    library: Arc<PatternLibrary>,
    matcher: BoundedMatcher,
    hasher: ContentHasher,
}

impl StructuredDetector {
    pub fn new(library: Arc<PatternLibrary>, matcher: BoundedMatcher, hasher: ContentHasher) -> Self {
        Self {
            library,
            matcher,
            hasher,
        }
    }

    /// Detect structured PII in `text`
    pub fn detect(&self, text: &str) -> Vec<CandidateRedaction> {
        let whitelisted = self.whitelist_spans(text);
        let mut candidates = Vec::new();
        let mut suppressed = 0usize;

        for pattern in self.library.pii_patterns() {
            let spans = self
                .matcher
                .find_all(&pattern.name, &pattern.regex, text)
                .into_spans();

            for span in spans {
                if whitelisted.iter().any(|w| w.overlaps(&span)) {
                    suppressed += 1;
                    continue;
                }
                let Some(matched) = span.slice(text) else {
                    continue;
                };
                candidates.push(CandidateRedaction {
                    span,
                    pii_type: pattern.pii_type,
                    detection_method: DetectionMethod::Structured,
                    confidence: STRUCTURED_CONFIDENCE,
                    content_hash: self.hasher.hash(matched),
                });
            }
        }

        tracing::debug!(
            text_len = text.len(),
            count = candidates.len(),
            suppressed,
            "Structured PII detection complete"
        );

        candidates
    }

    fn whitelist_spans(&self, text: &str) -> Vec<TextSpan> {
        self.library
            .whitelist()
            .iter()
            .flat_map(|pattern| {
                self.matcher
                    .find_all(&pattern.name, &pattern.regex, text)
                    .into_spans()
            })
            .collect()
    }
}
