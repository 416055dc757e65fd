//! Marker substitution

use crate::pipeline::models::{ResolvedRedaction, TextSpan};
use thiserror::Error;

/// Redaction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedactionError {
    /// Span is empty, out of bounds or not on char boundaries
    #[error("span {span} is not valid for a text of {text_len} bytes")]
    InvalidSpan { span: TextSpan, text_len: usize },

    /// Two spans overlap
    #[error("spans {first} and {second} overlap")]
    Overlap { first: TextSpan, second: TextSpan },
}

/// Replace every resolved span with its `[PII_<TYPE>]` marker
///
/// Spans are applied in descending start order so earlier offsets stay valid.
pub fn apply(text: &str, resolved: &[ResolvedRedaction]) -> Result<String, RedactionError> {
    let mut spans: Vec<&ResolvedRedaction> = resolved.iter().collect();
    spans.sort_by_key(|r| r.span.start);

    for r in &spans {
        if !r.span.is_valid_for(text) {
            return Err(RedactionError::InvalidSpan {
                span: r.span,
                text_len: text.len(),
            });
        }
    }
    for pair in spans.windows(2) {
        if pair[0].span.overlaps(&pair[1].span) {
            return Err(RedactionError::Overlap {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let mut output = text.to_string();
    for r in spans.iter().rev() {
        output.replace_range(r.span.start..r.span.end, &r.pii_type.marker());
    }
    Ok(output)
}
