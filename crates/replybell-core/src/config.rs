//! TOML-based configuration.
//!
//! Holds:
//! - Log verbosity (0-3)
//! - The focus gate (`only_if_not_in_focus`)
//! - Label patterns for the busy heuristic
//! - Poll and recheck timings
//! - Notification rules keyed by minimum duration in seconds
//!
//! Configuration is loaded once at startup from
//! `~/.config/replybell/config.toml` and never reloaded. Every load is
//! validated; a malformed rule fails the load instead of misbehaving later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::{NotificationAction, RuleSet};
use crate::error::ConfigError;
use crate::log::Verbosity;

/// Written on first load when no config file exists.
pub const DEFAULT_CONFIG_TOML: &str = r#"# replybell configuration
# 0 = silent, 1 = minimal, 2 = detailed, 3 = very detailed
verbosity = 1
# Only notify when the watched page does not have focus
only_if_not_in_focus = false

[signal]
# A control whose label contains stop_label means a response is being generated
stop_label = "Stop"
run_label = "Run"

[monitor]
poll_interval_ms = 500
recheck_delay_ms = 100

# Minimum duration in seconds -> actions, in order.
# Actions: "tone", "desktop_alert", { speech = "text to speak" }
[notification_modes_by_duration]
"0" = ["tone", { speech = "Response ready!" }]
"10" = ["tone", "desktop_alert"]
"#;

/// Label patterns for the busy heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_stop_label")]
    pub stop_label: String,
    #[serde(default = "default_run_label")]
    pub run_label: String,
}

/// Timing of the two evaluation triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between a change notification and the re-sample, giving the
    /// page time to finish its own update.
    #[serde(default = "default_recheck_delay_ms")]
    pub recheck_delay_ms: u64,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default)]
    pub only_if_not_in_focus: bool,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Threshold key (seconds, as written) to ordered actions.
    #[serde(default = "default_notification_modes")]
    pub notification_modes_by_duration: BTreeMap<String, Vec<NotificationAction>>,
}

fn default_stop_label() -> String {
    "Stop".into()
}
fn default_run_label() -> String {
    "Run".into()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_recheck_delay_ms() -> u64 {
    100
}
fn default_notification_modes() -> BTreeMap<String, Vec<NotificationAction>> {
    BTreeMap::from([
        (
            "0".to_string(),
            vec![
                NotificationAction::Tone,
                NotificationAction::Speech("Response ready!".into()),
            ],
        ),
        (
            "10".to_string(),
            vec![NotificationAction::Tone, NotificationAction::DesktopAlert],
        ),
    ])
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            stop_label: default_stop_label(),
            run_label: default_run_label(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            recheck_delay_ms: default_recheck_delay_ms(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recheck_delay(&self) -> Duration {
        Duration::from_millis(self.recheck_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            only_if_not_in_focus: false,
            signal: SignalConfig::default(),
            monitor: MonitorConfig::default(),
            notification_modes_by_duration: default_notification_modes(),
        }
    }
}

/// Returns `~/.config/replybell[-dev]/` based on REPLYBELL_ENV.
///
/// Set REPLYBELL_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("REPLYBELL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("replybell-dev")
    } else {
        base_dir.join("replybell")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, has values of the
    /// wrong type, or fails [`validate`](Self::validate).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path. A missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from the default location, writing the default file first if
    /// none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or if the
    /// default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if !path.exists() {
            Self::write_default(&path)?;
        }
        Self::load_from(&path)
    }

    /// Write the commented default config file to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Check everything serde cannot: timings, labels, and the rule table.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.signal.stop_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "signal.stop_label".into(),
                message: "must not be empty".into(),
            });
        }
        if self.signal.run_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "signal.run_label".into(),
                message: "must not be empty".into(),
            });
        }
        self.rule_set().map(|_| ())
    }

    /// Build the resolved rule table from the threshold map.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric, negative, non-finite, or duplicate
    /// thresholds.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::from_config_map(&self.notification_modes_by_duration)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_matches_default_config() {
        let parsed = Config::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let cfg = Config::from_toml_str("verbosity = 2").unwrap();
        assert_eq!(cfg.verbosity, Verbosity::DETAILED);
        assert_eq!(cfg.monitor.poll_interval_ms, 500);
        assert_eq!(cfg.monitor.recheck_delay_ms, 100);
        assert_eq!(cfg.signal.stop_label, "Stop");
        assert_eq!(cfg.notification_modes_by_duration.len(), 2);
    }

    #[test]
    fn test_legacy_mode_names_are_accepted() {
        let cfg = Config::from_toml_str(
            r#"
            [notification_modes_by_duration]
            "0" = ["bell", "desktop_notif"]
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.notification_modes_by_duration["0"],
            vec![NotificationAction::Tone, NotificationAction::DesktopAlert]
        );
    }

    #[test]
    fn test_unknown_mode_fails_load() {
        let err = Config::from_toml_str(
            r#"
            [notification_modes_by_duration]
            "0" = ["fireworks"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn test_verbosity_out_of_range_fails_load() {
        assert!(Config::from_toml_str("verbosity = 4").is_err());
    }

    #[test]
    fn test_zero_poll_interval_fails_validation() {
        let err = Config::from_toml_str("[monitor]\npoll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "monitor.poll_interval_ms"));
    }

    #[test]
    fn test_empty_stop_label_fails_validation() {
        let err = Config::from_toml_str("[signal]\nstop_label = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "signal.stop_label"));
    }

    #[test]
    fn test_get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("verbosity").as_deref(), Some("1"));
        assert_eq!(cfg.get("monitor.poll_interval_ms").as_deref(), Some("500"));
        assert_eq!(cfg.get("signal.stop_label").as_deref(), Some("Stop"));
        assert!(cfg.get("signal.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn test_load_from_reports_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/replybell/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }
}
