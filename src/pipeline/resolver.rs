//! Span conflict resolution

use crate::pipeline::models::{CandidateRedaction, ResolvedRedaction};
use std::cmp::{Ordering, Reverse};

/// Merge candidates into a non-overlapping set sorted by start
///
/// Candidates are visited by `(start, longest first, method priority, type)`;
/// the stable sort keeps detection order for anything still tied. A candidate
/// that overlaps accepted spans replaces them only if it beats every one of
/// them, otherwise it is dropped.
pub fn merge(candidates: Vec<CandidateRedaction>) -> Vec<ResolvedRedaction> {
    let mut ordered = candidates;
    ordered.retain(|c| !c.span.is_empty());
    ordered.sort_by_key(|c| {
        (
            c.span.start,
            Reverse(c.span.end),
            c.detection_method.priority(),
            c.pii_type,
        )
    });

    let mut accepted: Vec<ResolvedRedaction> = Vec::with_capacity(ordered.len());

    for candidate in ordered {
        let overlapping: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, a)| a.span.overlaps(&candidate.span))
            .map(|(idx, _)| idx)
            .collect();

        if overlapping.is_empty() {
            accepted.push(candidate);
            continue;
        }

        if overlapping
            .iter()
            .all(|&idx| beats(&candidate, &accepted[idx]) == Ordering::Greater)
        {
            for idx in overlapping.into_iter().rev() {
                accepted.remove(idx);
            }
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|r| r.span.start);
    accepted
}

/// Greater when `candidate` should replace `incumbent`
fn beats(candidate: &CandidateRedaction, incumbent: &CandidateRedaction) -> Ordering {
    incumbent
        .detection_method
        .priority()
        .cmp(&candidate.detection_method.priority())
        .then_with(|| candidate.span.len().cmp(&incumbent.span.len()))
        .then_with(|| {
            candidate
                .confidence
                .partial_cmp(&incumbent.confidence)
                .unwrap_or(Ordering::Equal)
        })
}
