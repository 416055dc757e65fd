//! Degradation ladder
//!
//! Levels are entered top-down and never climbed back up within one call.
//! Each fault moves the run to the level that fault calls for, or at least one
//! step further down than the current level, so the ladder always
//! terminates at MINIMAL. A match timeout is not a ladder input: the pattern
//! counts as having no matches and the level stays where it is.

use crate::domain::{FaultCategory, PipelineFault};
use crate::log_degradation;
use crate::pipeline::models::DegradationLevel;

/// Per-call ladder state
#[derive(Debug, Clone, Default)]
pub struct DegradationController {
    level: DegradationLevel,
    fault: Option<FaultCategory>,
}

impl DegradationController {
    /// Start at a given level
    pub fn starting_at(level: DegradationLevel) -> Self {
        Self { level, fault: None }
    }

    pub fn level(&self) -> DegradationLevel {
        self.level
    }

    /// Last absorbed fault
    pub fn fault(&self) -> Option<FaultCategory> {
        self.fault
    }

    /// Absorb a fault and move down the ladder
    pub fn degrade(&mut self, fault: &PipelineFault) -> DegradationLevel {
        let category = fault.category();
        let Some(target) = target_level(category) else {
            tracing::debug!(cause = %fault, level = %self.level, "Non-fatal fault, level kept");
            return self.level;
        };
        let next = target.max(step_down(self.level));

        log_degradation!(self.level, next, category);
        tracing::debug!(cause = %fault, "Degradation cause");

        self.level = next;
        self.fault = Some(category);
        next
    }
}

/// Level a fault category sends the run to, `None` when it never moves it
pub fn target_level(category: FaultCategory) -> Option<DegradationLevel> {
    match category {
        FaultCategory::MatchTimeout => None,
        FaultCategory::RecognizerUnavailable => Some(DegradationLevel::PiiStructuredOnly),
        FaultCategory::CanonicalizationFault => Some(DegradationLevel::NoCanonicalization),
        FaultCategory::UnrecoverableFault => Some(DegradationLevel::Minimal),
    }
}

fn step_down(level: DegradationLevel) -> DegradationLevel {
    match level {
        DegradationLevel::Full => DegradationLevel::PiiStructuredOnly,
        DegradationLevel::PiiStructuredOnly => DegradationLevel::NoCanonicalization,
        DegradationLevel::NoCanonicalization | DegradationLevel::Minimal => {
            DegradationLevel::Minimal
        }
    }
}
