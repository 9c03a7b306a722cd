//! Duration threshold rules.
//!
//! A rule set maps minimum durations to action lists. Resolution scans the
//! thresholds from largest to smallest and takes the first one that the
//! observed duration reaches.

use std::collections::BTreeMap;

use super::NotificationAction;
use crate::error::ConfigError;

/// Actions fired for durations at or above `threshold_secs`
/// (until a larger threshold takes over).
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub threshold_secs: f64,
    pub actions: Vec<NotificationAction>,
}

/// Validated rule table, kept sorted by descending threshold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
}

impl RuleSet {
    /// Build from already-parsed rules.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite thresholds, or if two
    /// rules share a threshold.
    pub fn new(rules: Vec<ThresholdRule>) -> Result<Self, ConfigError> {
        let keyed = rules
            .into_iter()
            .map(|rule| (rule.threshold_secs.to_string(), rule))
            .collect();
        Self::from_keyed(keyed)
    }

    /// Build from the config map, whose keys are thresholds written as strings.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a number, is negative or non-finite,
    /// or parses to the same value as another key (`"10"` and `"10.0"`).
    pub fn from_config_map(
        map: &BTreeMap<String, Vec<NotificationAction>>,
    ) -> Result<Self, ConfigError> {
        let mut keyed = Vec::with_capacity(map.len());
        for (key, actions) in map {
            let threshold_secs =
                key.trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: format!("notification_modes_by_duration.{key}"),
                        message: "threshold must be a number of seconds".into(),
                    })?;
            keyed.push((
                key.clone(),
                ThresholdRule {
                    threshold_secs,
                    actions: actions.clone(),
                },
            ));
        }
        Self::from_keyed(keyed)
    }

    fn from_keyed(mut keyed: Vec<(String, ThresholdRule)>) -> Result<Self, ConfigError> {
        for (key, rule) in &keyed {
            if !rule.threshold_secs.is_finite() || rule.threshold_secs < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("notification_modes_by_duration.{key}"),
                    message: "threshold must be a finite, non-negative number of seconds".into(),
                });
            }
        }

        keyed.sort_by(|a, b| b.1.threshold_secs.total_cmp(&a.1.threshold_secs));
        for pair in keyed.windows(2) {
            if pair[0].1.threshold_secs == pair[1].1.threshold_secs {
                return Err(ConfigError::DuplicateThreshold {
                    seconds: pair[0].1.threshold_secs,
                    first: pair[1].0.clone(),
                    second: pair[0].0.clone(),
                });
            }
        }

        Ok(Self {
            rules: keyed.into_iter().map(|(_, rule)| rule).collect(),
        })
    }

    /// The rule for the largest threshold not above `duration_secs`.
    pub fn resolve(&self, duration_secs: f64) -> Option<&ThresholdRule> {
        self.rules
            .iter()
            .find(|rule| duration_secs >= rule.threshold_secs)
    }

    /// Thresholds in ascending order.
    pub fn thresholds(&self) -> Vec<f64> {
        self.rules.iter().rev().map(|r| r.threshold_secs).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
