//! Pipeline data models

use crate::domain::FaultCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters kept in a removed-section preview
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Half-open byte range `[start, end)` into one text buffer
///
/// Offsets are UTF-8 byte offsets and always lie on character boundaries of
/// the buffer they were produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Half-open overlap test
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check that this span is non-empty, in bounds and on char boundaries of `text`
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.start < self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }

    /// Slice `text` by this span, if the span is valid for it
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.is_valid_for(text) {
            text.get(self.start..self.end)
        } else {
            None
        }
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Category of a removable message section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    /// Quoted reply lines (`> ...`)
    Quote,
    /// "On ... wrote:" style reply headers
    ReplyHeader,
    /// Signature separators and blocks
    Signature,
    /// Legal and privacy disclaimers
    Disclaimer,
    /// Forwarded-message markers
    ForwardMarker,
    /// Formulaic closings ("Cordiali saluti")
    Closing,
}

impl SectionCategory {
    /// Stable label used in logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::ReplyHeader => "reply_header",
            Self::Signature => "signature",
            Self::Disclaimer => "disclaimer",
            Self::ForwardMarker => "forward_marker",
            Self::Closing => "closing",
        }
    }

    /// Categories governed by the quote-removal switch
    pub fn is_quote_family(&self) -> bool {
        matches!(self, Self::Quote | Self::ReplyHeader | Self::ForwardMarker)
    }

    /// Categories governed by the signature-removal switch
    pub fn is_signature_family(&self) -> bool {
        matches!(self, Self::Signature | Self::Disclaimer | Self::Closing)
    }
}

/// A section removed by the canonicalizer
///
/// The span refers to the text as it was when the producing pattern ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedSection {
    pub span: TextSpan,
    pub category: SectionCategory,
    /// Name of the pattern that matched
    pub pattern: String,
    /// At most [`PREVIEW_MAX_CHARS`] characters of the matched text
    pub preview: String,
    pub confidence: f32,
}

/// PII type of a redaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiType {
    Email,
    Phone,
    TaxId,
    VatId,
    BankAccount,
    PersonName,
    Organization,
}

impl PiiType {
    /// Upper-case label, as it appears in markers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::TaxId => "TAX_ID",
            Self::VatId => "VAT_ID",
            Self::BankAccount => "BANK_ACCOUNT",
            Self::PersonName => "PERSON_NAME",
            Self::Organization => "ORGANIZATION",
        }
    }

    /// Replacement marker, e.g. `[PII_EMAIL]`
    pub fn marker(&self) -> String {
        format!("[PII_{}]", self.label())
    }

    /// Whether this type can only come from the entity recognizer
    pub fn is_entity_type(&self) -> bool {
        matches!(self, Self::PersonName | Self::Organization)
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detection strategy that produced a candidate
///
/// Closed set; [`DetectionMethod::priority`] is the priority table used by the
/// span resolver (lower wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    /// Pattern library PII patterns
    Structured,
    /// External entity recognizer
    Entity,
}

impl DetectionMethod {
    /// Resolver priority, lower is stronger
    pub fn priority(&self) -> u8 {
        match self {
            Self::Structured => 0,
            Self::Entity => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Structured => "STRUCTURED",
            Self::Entity => "ENTITY",
        }
    }
}

/// A PII detection before conflict resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRedaction {
    pub span: TextSpan,
    pub pii_type: PiiType,
    pub detection_method: DetectionMethod,
    pub confidence: f32,
    /// Keyed digest of the matched text
    pub content_hash: String,
}

/// A redaction accepted by the span resolver
///
/// Same shape as a candidate; a resolved set is pairwise non-overlapping and
/// sorted by start.
pub type ResolvedRedaction = CandidateRedaction;

/// Degradation level reached by a pipeline run
///
/// Ordered from most to least complete processing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DegradationLevel {
    /// Canonicalization plus structured and entity redaction
    #[default]
    Full,
    /// Entity recognizer skipped
    PiiStructuredOnly,
    /// Structured redaction on raw text
    NoCanonicalization,
    /// Truncated raw excerpt, no guarantees
    Minimal,
}

impl DegradationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::PiiStructuredOnly => "PII_STRUCTURED_ONLY",
            Self::NoCanonicalization => "NO_CANONICALIZATION",
            Self::Minimal => "MINIMAL",
        }
    }

    /// All levels, top-down
    pub fn all() -> [DegradationLevel; 4] {
        [
            Self::Full,
            Self::PiiStructuredOnly,
            Self::NoCanonicalization,
            Self::Minimal,
        ]
    }
}

impl fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How PII is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PiiMode {
    /// Detect and replace with markers
    #[default]
    Redact,
    /// Detect and report spans, leave text intact
    DetectOnly,
    /// No PII processing
    Disabled,
}

impl PiiMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Redact => "redact",
            Self::DetectOnly => "detect_only",
            Self::Disabled => "disabled",
        }
    }
}

impl std::str::FromStr for PiiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redact" => Ok(Self::Redact),
            "detect_only" => Ok(Self::DetectOnly),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!(
                "invalid pii_mode '{other}', expected redact, detect_only or disabled"
            )),
        }
    }
}

/// Versions of the components that produced an outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineVersion {
    pub engine: String,
    /// Pattern library version
    pub canonicalization: String,
    pub pattern_library: String,
    pub pii_redaction: String,
}

impl PipelineVersion {
    /// Version of the redaction scheme (marker format, hashing, resolver rules)
    pub const PII_REDACTION: &'static str = "1.0.0";

    pub fn new(pattern_library_version: &str) -> Self {
        Self {
            engine: env!("CARGO_PKG_VERSION").to_string(),
            canonicalization: pattern_library_version.to_string(),
            pattern_library: pattern_library_version.to_string(),
            pii_redaction: Self::PII_REDACTION.to_string(),
        }
    }
}

/// Result of one pipeline run
///
/// Constructed once per input by the engine; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Canonical, redacted text (a raw excerpt at MINIMAL)
    pub text: String,
    pub redactions: Vec<ResolvedRedaction>,
    pub removed_sections: Vec<RemovedSection>,
    pub degradation_level: DegradationLevel,
    /// Category of the last fault absorbed on the way down the ladder
    pub fault: Option<FaultCategory>,
    pub pii_mode: PiiMode,
    /// Unkeyed SHA-256 hex of the raw input
    pub original_hash: String,
    pub pipeline_version: PipelineVersion,
    pub processed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl PipelineOutcome {
    /// True below FULL
    pub fn is_degraded(&self) -> bool {
        self.degradation_level != DegradationLevel::Full
    }

    /// True when the output must be reviewed before automated use
    pub fn requires_review(&self) -> bool {
        matches!(
            self.degradation_level,
            DegradationLevel::NoCanonicalization | DegradationLevel::Minimal
        )
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Largest char boundary of `text` not greater than `max_bytes`
pub fn floor_char_boundary(text: &str, max_bytes: usize) -> usize {
    if max_bytes >= text.len() {
        return text.len();
    }
    let mut idx = max_bytes;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
