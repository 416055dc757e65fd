//! Observability counts for single outcomes and batches
//!
//! Everything here is counts, levels and timings. No text, previews or
//! hashes are aggregated.

use crate::pipeline::models::{
    DegradationLevel, DetectionMethod, PiiType, PipelineOutcome, SectionCategory,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts for one outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMetrics {
    pub degradation_level: DegradationLevel,
    pub removed_sections_by_category: BTreeMap<SectionCategory, usize>,
    pub redactions_by_type: BTreeMap<PiiType, usize>,
    pub redactions_by_method: BTreeMap<DetectionMethod, usize>,
}

impl OutcomeMetrics {
    pub fn removed_sections_total(&self) -> usize {
        self.removed_sections_by_category.values().sum()
    }

    pub fn redactions_total(&self) -> usize {
        self.redactions_by_type.values().sum()
    }
}

impl PipelineOutcome {
    /// Observability counts of this outcome
    pub fn metrics(&self) -> OutcomeMetrics {
        let mut metrics = OutcomeMetrics {
            degradation_level: self.degradation_level,
            ..OutcomeMetrics::default()
        };
        for section in &self.removed_sections {
            *metrics
                .removed_sections_by_category
                .entry(section.category)
                .or_insert(0) += 1;
        }
        for redaction in &self.redactions {
            *metrics
                .redactions_by_type
                .entry(redaction.pii_type)
                .or_insert(0) += 1;
            *metrics
                .redactions_by_method
                .entry(redaction.detection_method)
                .or_insert(0) += 1;
        }
        metrics
    }
}

/// Aggregate report over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub by_level: BTreeMap<DegradationLevel, usize>,
    pub removed_sections_by_category: BTreeMap<SectionCategory, usize>,
    pub redactions_by_type: BTreeMap<PiiType, usize>,
    pub redactions_by_method: BTreeMap<DetectionMethod, usize>,
    /// Outcomes at NO_CANONICALIZATION or MINIMAL
    pub requiring_review: usize,
    pub total_duration_ms: u64,
    pub average_duration_ms: f64,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the report
    pub fn add_outcome(&mut self, outcome: &PipelineOutcome) {
        let metrics = outcome.metrics();

        self.total += 1;
        *self.by_level.entry(metrics.degradation_level).or_insert(0) += 1;
        merge_counts(
            &mut self.removed_sections_by_category,
            &metrics.removed_sections_by_category,
        );
        merge_counts(&mut self.redactions_by_type, &metrics.redactions_by_type);
        merge_counts(&mut self.redactions_by_method, &metrics.redactions_by_method);

        if outcome.requires_review() {
            self.requiring_review += 1;
        }

        self.total_duration_ms += outcome.duration_ms;
        self.average_duration_ms = self.total_duration_ms as f64 / self.total as f64;
    }

    /// Count of outcomes at `level`
    pub fn count_at(&self, level: DegradationLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }

    /// Total redactions across the batch
    pub fn redactions_total(&self) -> usize {
        self.redactions_by_type.values().sum()
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push_str("Batch summary\n");
        output.push_str("-------------\n");
        output.push_str(&format!("  Messages processed:   {}\n", self.total));
        output.push_str(&format!("  Requiring review:     {}\n", self.requiring_review));
        output.push_str(&format!(
            "  Avg processing time:  {:.1} ms\n",
            self.average_duration_ms
        ));

        output.push_str("\n  Degradation levels\n");
        for level in DegradationLevel::all() {
            output.push_str(&format!(
                "    {:24} {:>6}\n",
                level.label(),
                self.count_at(level)
            ));
        }

        if !self.removed_sections_by_category.is_empty() {
            output.push_str("\n  Removed sections\n");
            for (category, count) in &self.removed_sections_by_category {
                output.push_str(&format!("    {:24} {:>6}\n", category.label(), count));
            }
        }

        if !self.redactions_by_type.is_empty() {
            output.push_str("\n  Redactions\n");
            for (pii_type, count) in &self.redactions_by_type {
                output.push_str(&format!("    {:24} {:>6}\n", pii_type.label(), count));
            }
            for (method, count) in &self.redactions_by_method {
                output.push_str(&format!("    {:24} {:>6}\n", method.label(), count));
            }
        }

        output
    }
}

fn merge_counts<K: Ord + Copy>(target: &mut BTreeMap<K, usize>, source: &BTreeMap<K, usize>) {
    for (key, count) in source {
        *target.entry(*key).or_insert(0) += count;
    }
}
