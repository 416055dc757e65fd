//! Bounded pattern matching
//!
//! The `regex` crate guarantees linear-time search, so a single search step
//! cannot run away. The remaining risk is a pattern with a very large number
//! of matches on a very large input: the matcher checks a wall-clock deadline
//! between matches and gives up as a whole when it is exceeded. On timeout no
//! partial matches are returned.

use crate::pipeline::models::TextSpan;
use regex::Regex;
use std::time::{Duration, Instant};

/// Default per-pattern budget
pub const DEFAULT_MATCH_BUDGET: Duration = Duration::from_secs(1);

/// Result of one bounded match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// All non-overlapping matches, in order
    Matches(Vec<TextSpan>),
    /// Budget exceeded, no matches exposed
    TimedOut,
}

impl MatchResult {
    /// Matches, with a timeout counting as zero matches
    pub fn into_spans(self) -> Vec<TextSpan> {
        match self {
            Self::Matches(spans) => spans,
            Self::TimedOut => Vec::new(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Executes patterns under a wall-clock budget
#[derive(Debug, Clone, Copy)]
pub struct BoundedMatcher {
    budget: Duration,
}

impl Default for BoundedMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_BUDGET)
    }
}

impl BoundedMatcher {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Find all non-empty, non-overlapping matches of `regex` in `text`
    pub fn find_all(&self, name: &str, regex: &Regex, text: &str) -> MatchResult {
        let started = Instant::now();
        let mut spans = Vec::new();

        for m in regex.find_iter(text) {
            if started.elapsed() > self.budget {
                tracing::warn!(
                    pattern = name,
                    text_len = text.len(),
                    budget_ms = self.budget.as_millis() as u64,
                    "Pattern exceeded matching budget, treating as no matches"
                );
                return MatchResult::TimedOut;
            }
            if m.start() < m.end() {
                spans.push(TextSpan::new(m.start(), m.end()));
            }
        }

        // The final search step can also overrun
        if started.elapsed() > self.budget {
            tracing::warn!(
                pattern = name,
                text_len = text.len(),
                budget_ms = self.budget.as_millis() as u64,
                "Pattern exceeded matching budget, treating as no matches"
            );
            return MatchResult::TimedOut;
        }

        MatchResult::Matches(spans)
    }
}
