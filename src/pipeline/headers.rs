//! Header redaction

use crate::pipeline::canonicalizer::canonicalize_subject;
use crate::pipeline::engine::PipelineEngine;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

/// Sentinel written in place of a header value whose redaction failed
pub const REDACTION_FAILED: &str = "[REDACTION_FAILED]";

/// Headers that carry addresses
const ADDRESS_HEADERS: &[&str] = &["from", "to", "cc", "bcc", "reply-to", "sender"];

impl PipelineEngine {
    /// Redact PII from message headers
    ///
    /// Header names are lowercased. Address headers and `subject` go through
    /// the PII chain (the subject is canonicalized first); other headers pass
    /// through unchanged. A header whose redaction fails is replaced by
    /// [`REDACTION_FAILED`]. This never fails as a whole.
    pub async fn redact_headers<I, K, V>(&self, headers: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut redacted = BTreeMap::new();

        for (name, value) in headers {
            let name = name.as_ref().trim().to_lowercase();
            let value = value.as_ref();

            let output = if ADDRESS_HEADERS.contains(&name.as_str()) {
                self.redact_header_value(&name, value).await
            } else if name == "subject" {
                self.redact_header_value(&name, &canonicalize_subject(value))
                    .await
            } else {
                value.to_string()
            };

            redacted.insert(name, output);
        }

        redacted
    }

    async fn redact_header_value(&self, name: &str, value: &str) -> String {
        let attempt = AssertUnwindSafe(async {
            match self.redact_pii(value, self.has_recognizer()).await {
                Ok(result) => Ok(result),
                // Recognizer trouble on a header falls back to structured-only
                Err(_) if self.has_recognizer() => self.redact_pii(value, false).await,
                Err(fault) => Err(fault),
            }
        })
        .catch_unwind()
        .await;

        match attempt {
            Ok(Ok((text, _))) => text,
            Ok(Err(fault)) => {
                tracing::warn!(
                    header = name,
                    fault = %fault.category(),
                    "Header redaction failed"
                );
                REDACTION_FAILED.to_string()
            }
            Err(_) => {
                tracing::warn!(header = name, "Header redaction panicked");
                REDACTION_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::PipelineConfig;
    use crate::pipeline::detector::{EntityRecognizer, RecognizedEntity, RecognizerError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        async fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
            Err(RecognizerError::Unavailable("offline".to_string()))
        }
    }

    fn engine() -> PipelineEngine {
        PipelineEngine::new(&PipelineConfig::with_key("Zq8vN2mR7tLw4xKc")).unwrap()
    }

    #[tokio::test]
    async fn test_address_headers_redacted() {
        let headers = vec![
            ("From", "Mario Rossi <mario.rossi@example.com>"),
            ("To", "ufficio@example.it"),
            ("Message-ID", "<abc@mail.example.com>"),
        ];
        let redacted = engine().redact_headers(headers).await;

        assert_eq!(redacted["from"], "Mario Rossi <[PII_EMAIL]>");
        assert_eq!(redacted["to"], "[PII_EMAIL]");
        assert_eq!(redacted["message-id"], "<abc@mail.example.com>");
    }

    #[tokio::test]
    async fn test_subject_canonicalized_then_redacted() {
        let redacted = engine()
            .redact_headers([("Subject", "RE: Fwd: contatto a.b@example.com")])
            .await;
        assert_eq!(redacted["subject"], "contatto [PII_EMAIL]");
    }

    #[tokio::test]
    async fn test_recognizer_failure_falls_back_to_structured() {
        let engine = engine().with_recognizer(Arc::new(FailingRecognizer));
        let redacted = engine.redact_headers([("cc", "x.y@example.com")]).await;
        assert_eq!(redacted["cc"], "[PII_EMAIL]");
    }

    #[tokio::test]
    async fn test_empty_headers() {
        let headers: Vec<(String, String)> = Vec::new();
        assert!(engine().redact_headers(headers).await.is_empty());
    }
}
