//! Dispatch outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of executing a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Action in its display form, e.g. `speech:"Ready"`
    pub action: String,
    /// Execution status
    pub status: ExecutionStatus,
}

/// Status of action execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Action handed to its channel
    Success,
    /// Channel missing or failed
    Failed {
        /// Human-readable reason for failure
        reason: String,
    },
    /// Action was skipped due to condition
    Skipped {
        /// Human-readable reason for skip
        reason: String,
    },
}

/// Why a dispatch performed no actions at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    /// `only_if_not_in_focus` is set and the page has focus
    PageInFocus,
    /// No threshold is at or below the duration
    NoMatchingRule,
}

/// Record of one dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub dispatched_at: DateTime<Utc>,
    pub duration_secs: f64,
    /// Threshold of the resolved rule, if any
    pub threshold_secs: Option<f64>,
    pub suppressed: Option<Suppression>,
    /// Results of all executed actions, in order
    pub outcomes: Vec<ActionOutcome>,
}

impl DispatchReport {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            dispatched_at: Utc::now(),
            duration_secs,
            threshold_secs: None,
            suppressed: None,
            outcomes: Vec::new(),
        }
    }

    pub fn suppressed(duration_secs: f64, reason: Suppression) -> Self {
        Self {
            suppressed: Some(reason),
            ..Self::new(duration_secs)
        }
    }

    /// Get the number of successful actions
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExecutionStatus::Success))
            .count()
    }

    /// Get the number of failed actions
    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExecutionStatus::Failed { .. }))
            .count()
    }

    /// Get the number of skipped actions
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExecutionStatus::Skipped { .. }))
            .count()
    }
}
