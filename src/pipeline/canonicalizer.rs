//! Text and subject canonicalization
//!
//! Canonicalization runs in rounds. A round normalizes line endings, applies
//! NFC, maps Unicode space separators to ASCII space, strips every enabled
//! section pattern in library order and cleans up whitespace. Rounds repeat
//! until one of them removes nothing and leaves the text unchanged, which
//! makes `canonicalize` idempotent even when stripping one section exposes
//! another.

use crate::pipeline::matcher::{BoundedMatcher, MatchResult};
use crate::pipeline::models::{char_prefix, RemovedSection, TextSpan, PREVIEW_MAX_CHARS};
use crate::pipeline::patterns::{PatternLibrary, SectionPattern};
use std::sync::Arc;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Upper bound on canonicalization rounds
const MAX_ROUNDS: usize = 16;

/// Canonicalization errors
#[derive(Debug, Error)]
pub enum CanonicalizationError {
    /// A matched span does not fit the text it was matched against
    #[error("pattern '{pattern}' produced span {span} outside a text of {text_len} bytes")]
    InvalidSpan {
        pattern: String,
        span: TextSpan,
        text_len: usize,
    },

    /// Any other canonicalizer failure
    #[error("{0}")]
    Failed(String),
}

/// Canonical text plus the audit trail of removed sections
#[derive(Debug, Clone, PartialEq)]
pub struct Canonicalized {
    pub text: String,
    pub removed_sections: Vec<RemovedSection>,
}

/// Canonicalization seam used by the engine
pub trait TextCanonicalizer: Send + Sync {
    /// Produce the canonical form of `text`
    fn canonicalize(&self, text: &str) -> Result<Canonicalized, CanonicalizationError>;
}

/// Section removal switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizerOptions {
    /// Quotes, reply headers and forward markers
    pub remove_quotes: bool,
    /// Signatures, disclaimers and closings
    pub remove_signatures: bool,
}

impl Default for CanonicalizerOptions {
    fn default() -> Self {
        Self {
            remove_quotes: true,
            remove_signatures: true,
        }
    }
}

/// Pattern-library driven canonicalizer
pub struct PatternCanonicalizer {
    library: Arc<PatternLibrary>,
    matcher: BoundedMatcher,
    options: CanonicalizerOptions,
}

impl PatternCanonicalizer {
    pub fn new(
        library: Arc<PatternLibrary>,
        matcher: BoundedMatcher,
        options: CanonicalizerOptions,
    ) -> Self {
        Self {
            library,
            matcher,
            options,
        }
    }

    fn is_enabled(&self, pattern: &SectionPattern) -> bool {
        if pattern.category.is_quote_family() {
            self.options.remove_quotes
        } else {
            self.options.remove_signatures
        }
    }

    /// One full round over `text`
    fn round(
        &self,
        text: &str,
        removed: &mut Vec<RemovedSection>,
    ) -> Result<String, CanonicalizationError> {
        let mut current = normalize_text(text);

        for pattern in self.library.sections() {
            if !self.is_enabled(pattern) {
                continue;
            }

            let spans = match self.matcher.find_all(&pattern.name, &pattern.regex, &current) {
                MatchResult::Matches(spans) => spans,
                MatchResult::TimedOut => continue,
            };
            if spans.is_empty() {
                continue;
            }

            for span in &spans {
                let matched =
                    span.slice(&current)
                        .ok_or_else(|| CanonicalizationError::InvalidSpan {
                            pattern: pattern.name.clone(),
                            span: *span,
                            text_len: current.len(),
                        })?;
                removed.push(RemovedSection {
                    span: *span,
                    category: pattern.category,
                    pattern: pattern.name.clone(),
                    preview: char_prefix(matched, PREVIEW_MAX_CHARS).to_string(),
                    confidence: pattern.confidence,
                });
            }

            tracing::debug!(
                pattern = %pattern.name,
                category = pattern.category.label(),
                count = spans.len(),
                "Removed sections"
            );

            current = replace_spans(&current, &spans);
        }

        Ok(cleanup_whitespace(&current))
    }
}

impl TextCanonicalizer for PatternCanonicalizer {
    fn canonicalize(&self, text: &str) -> Result<Canonicalized, CanonicalizationError> {
        let mut removed_sections = Vec::new();
        let mut current = text.to_string();

        for round in 0..MAX_ROUNDS {
            let before = removed_sections.len();
            let next = self.round(&current, &mut removed_sections)?;
            let stable = removed_sections.len() == before && next == current;
            current = next;
            if stable {
                return Ok(Canonicalized {
                    text: current,
                    removed_sections,
                });
            }
            tracing::trace!(round, text_len = current.len(), "Canonicalization round");
        }

        tracing::warn!(
            rounds = MAX_ROUNDS,
            text_len = current.len(),
            "Canonicalization did not reach a fixpoint"
        );
        Ok(Canonicalized {
            text: current,
            removed_sections,
        })
    }
}

/// Line endings, NFC and Unicode space separators
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    unified
        .nfc()
        .map(|c| if is_space_separator(c) { ' ' } else { c })
        .collect()
}

/// Unicode general category Zs
fn is_space_separator(c: char) -> bool {
    matches!(
        c,
        '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Replace each span (sorted, non-overlapping) with a single newline
fn replace_spans(text: &str, spans: &[TextSpan]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        out.push('\n');
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Trailing whitespace per line, runs of spaces, runs of blank lines, outer trim
fn cleanup_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            newlines += 1;
        }
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            for _ in 0..newlines.min(2) {
                out.push('\n');
            }
        }
        newlines = 0;

        let mut previous_space = false;
        for c in line.chars() {
            if c == ' ' {
                if previous_space {
                    continue;
                }
                previous_space = true;
            } else {
                previous_space = false;
            }
            out.push(c);
        }
    }

    out.trim().to_string()
}

/// Canonical form of a subject line
///
/// Applies NFC, strips any chain of reply/forward prefixes (`re:`, `fw:`,
/// `fwd:`, `r:`, `i:`, any case) anchored at the very start, lowercases, maps
/// Unicode space separators to ASCII space and trims. Inner whitespace runs
/// are kept, and leading whitespace shields a prefix from stripping.
pub fn canonicalize_subject(subject: &str) -> String {
    let mut current: String = subject.nfc().collect();

    loop {
        let stripped = strip_subject_prefix(&current);
        if stripped.len() == current.len() {
            break;
        }
        current = stripped.to_string();
    }

    current
        .to_lowercase()
        .chars()
        .map(|c| if is_space_separator(c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

fn strip_subject_prefix(subject: &str) -> &str {
    const PREFIXES: [&str; 5] = ["fwd:", "fw:", "re:", "r:", "i:"];
    for prefix in PREFIXES {
        let matches = subject
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return subject[prefix.len()..].trim_start();
        }
    }
    subject
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::SectionCategory;
    use test_case::test_case;

    fn canonicalizer() -> PatternCanonicalizer {
        canonicalizer_with(CanonicalizerOptions::default())
    }

    fn canonicalizer_with(options: CanonicalizerOptions) -> PatternCanonicalizer {
        PatternCanonicalizer::new(
            Arc::new(PatternLibrary::embedded().unwrap()),
            BoundedMatcher::default(),
            options,
        )
    }

    #[test]
    fn test_quote_removed() {
        let result = canonicalizer()
            .canonicalize("> quoted line\nReal content")
            .unwrap();
        assert_eq!(result.text, "Real content");
        assert_eq!(result.removed_sections.len(), 1);
        let section = &result.removed_sections[0];
        assert_eq!(section.category, SectionCategory::Quote);
        assert_eq!(section.pattern, "quote_standard");
        assert_eq!(section.preview, "> quoted line");
        assert_eq!(section.span, TextSpan::new(0, 13));
    }

    #[test]
    fn test_line_endings_normalized() {
        let result = canonicalizer().canonicalize("uno\r\ndue\rtre").unwrap();
        assert_eq!(result.text, "uno\ndue\ntre");
    }

    #[test]
    fn test_unicode_spaces_mapped() {
        let result = canonicalizer()
            .canonicalize("a\u{00A0}b\u{3000}c\u{2009}d")
            .unwrap();
        assert_eq!(result.text, "a b c d");
    }

    #[test]
    fn test_nfc_applied() {
        let result = canonicalizer().canonicalize("perche\u{0301}").unwrap();
        assert_eq!(result.text, "perch\u{00E9}");
    }

    #[test_case("a   b", "a b" ; "collapse spaces")]
    #[test_case("a\n\n\n\nb", "a\n\nb" ; "collapse newlines")]
    #[test_case("a   \nb\t ", "a\nb" ; "trailing whitespace")]
    #[test_case("\n\n  hello  \n\n", "hello" ; "outer trim")]
    fn test_whitespace_cleanup(input: &str, expected: &str) {
        assert_eq!(canonicalizer().canonicalize(input).unwrap().text, expected);
    }

    #[test]
    fn test_signature_and_closing_removed() {
        let text = "Vi confermo l'ordine.\n\nCordiali saluti,\n--\nMario";
        let result = canonicalizer().canonicalize(text).unwrap();
        assert!(!result.text.contains("Cordiali saluti"));
        assert!(!result.text.contains("--"));
        assert!(result.text.starts_with("Vi confermo l'ordine."));
        let categories: Vec<_> = result.removed_sections.iter().map(|s| s.category).collect();
        assert!(categories.contains(&SectionCategory::Signature));
        assert!(categories.contains(&SectionCategory::Closing));
    }

    #[test]
    fn test_reply_header_removed() {
        let text = "Va bene.\nIl giorno 12/02/2026 Luca ha scritto:\n> ciao";
        let result = canonicalizer().canonicalize(text).unwrap();
        assert_eq!(result.text, "Va bene.");
    }

    #[test]
    fn test_quote_switch_off_keeps_quotes() {
        let options = CanonicalizerOptions {
            remove_quotes: false,
            remove_signatures: true,
        };
        let result = canonicalizer_with(options)
            .canonicalize("> quoted line\nReal content\n--")
            .unwrap();
        assert_eq!(result.text, "> quoted line\nReal content");
        assert!(result
            .removed_sections
            .iter()
            .all(|s| s.category.is_signature_family()));
    }

    #[test]
    fn test_signature_switch_off_keeps_signatures() {
        let options = CanonicalizerOptions {
            remove_quotes: true,
            remove_signatures: false,
        };
        let result = canonicalizer_with(options)
            .canonicalize("> quoted\nBody\nCordiali saluti")
            .unwrap();
        assert_eq!(result.text, "Body\nCordiali saluti");
    }

    #[test]
    fn test_idempotent_on_canonical_text() {
        let c = canonicalizer();
        let first = c
            .canonicalize("Ciao,\n\n> vecchio\n>> piu vecchio\n\n\nNuovo testo  qui\n--\nFirma")
            .unwrap();
        let second = c.canonicalize(&first.text).unwrap();
        assert_eq!(second.text, first.text);
        assert!(second.removed_sections.is_empty());
    }

    #[test]
    fn test_preview_capped() {
        let line = format!("> {}", "x".repeat(500));
        let result = canonicalizer().canonicalize(&line).unwrap();
        assert_eq!(result.removed_sections[0].preview.chars().count(), PREVIEW_MAX_CHARS);
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let result = canonicalizer().canonicalize("").unwrap();
        assert_eq!(result.text, "");
        assert!(result.removed_sections.is_empty());
    }

    #[test_case("RE: Fattura", "fattura" ; "simple reply")]
    #[test_case("Re: R: FWD: Ordine 42", "ordine 42" ; "prefix chain")]
    #[test_case("I: Preventivo", "preventivo" ; "italian forward")]
    #[test_case("Fw:   Spedizione\u{00A0}urgente ", "spedizione urgente" ; "whitespace")]
    #[test_case("Reclamo", "reclamo" ; "word starting with re")]
    #[test_case("", "" ; "empty")]
    fn test_canonicalize_subject(input: &str, expected: &str) {
        assert_eq!(canonicalize_subject(input), expected);
    }

    #[test_case("Ordine   n.  42", "ordine   n.  42" ; "inner runs kept")]
    #[test_case("  Re: Ordine", "re: ordine" ; "leading space shields prefix")]
    #[test_case("re:re:FW:ordine", "ordine" ; "prefixes without spaces")]
    fn test_subject_whitespace_is_not_collapsed(input: &str, expected: &str) {
        assert_eq!(canonicalize_subject(input), expected);
    }
}
