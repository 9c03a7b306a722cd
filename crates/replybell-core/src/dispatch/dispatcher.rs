//! Notification dispatch.
//!
//! Maps a finished generation's duration to the configured actions and runs
//! them through the environment's alert channels. Dispatch never fails as a
//! whole: every action is attempted on its own, and a failing channel only
//! marks its own outcome as failed.

use super::channels::{AlertChannels, AlertSpec, Permission, ToneSpec, Utterance};
use super::report::{ActionOutcome, DispatchReport, ExecutionStatus, Suppression};
use super::{NotificationAction, RuleSet};
use crate::config::Config;
use crate::error::ConfigError;
use crate::log::{ComponentLog, LogLevel, Verbosity};
use crate::vlog;

pub struct NotificationDispatcher {
    rules: RuleSet,
    only_if_not_in_focus: bool,
    channels: Box<dyn AlertChannels>,
    /// Whether to actually execute actions (false for dry-run)
    dry_run: bool,
    log: ComponentLog,
}

impl NotificationDispatcher {
    /// Create a dispatcher from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config's rule table is invalid.
    pub fn new(config: &Config, channels: Box<dyn AlertChannels>) -> Result<Self, ConfigError> {
        Ok(Self::with_rules(
            config.rule_set()?,
            config.only_if_not_in_focus,
            channels,
            config.verbosity,
        ))
    }

    pub fn with_rules(
        rules: RuleSet,
        only_if_not_in_focus: bool,
        channels: Box<dyn AlertChannels>,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            rules,
            only_if_not_in_focus,
            channels,
            dry_run: false,
            log: ComponentLog::new("dispatch", verbosity),
        }
    }

    /// Resolve and report, but skip every action instead of executing it.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn channels(&self) -> &dyn AlertChannels {
        self.channels.as_ref()
    }

    /// Ask for desktop alert permission if it has not been decided yet.
    /// Meant to run once at startup so dispatch never blocks on a prompt.
    pub fn prepare_permission(&mut self) -> Permission {
        let current = self.channels.permission();
        vlog!(self.log, LogLevel::Decision, "Current notification permission: {current}");
        if current != Permission::Default || self.dry_run {
            return current;
        }
        vlog!(self.log, LogLevel::Decision, "Requesting notification permission");
        let result = self.channels.request_permission();
        vlog!(self.log, LogLevel::Decision, "Permission result: {result}");
        result
    }

    /// Fire the notifications for a generation that took `duration_secs`.
    pub fn dispatch(&self, duration_secs: f64) -> DispatchReport {
        vlog!(
            self.log,
            LogLevel::Decision,
            "dispatch called, permission: {}",
            self.channels.permission()
        );

        if self.only_if_not_in_focus && self.channels.has_focus() {
            vlog!(self.log, LogLevel::Decision, "Not showing notification: page is in focus");
            return DispatchReport::suppressed(duration_secs, Suppression::PageInFocus);
        }

        let Some(rule) = self.rules.resolve(duration_secs) else {
            vlog!(
                self.log,
                LogLevel::Decision,
                "Duration {duration_secs:.1}s matches no thresholds"
            );
            return DispatchReport::suppressed(duration_secs, Suppression::NoMatchingRule);
        };
        vlog!(
            self.log,
            LogLevel::Decision,
            "Duration {duration_secs:.1}s matches threshold {}s",
            rule.threshold_secs
        );

        let mut report = DispatchReport::new(duration_secs);
        report.threshold_secs = Some(rule.threshold_secs);

        if rule.actions.is_empty() {
            vlog!(
                self.log,
                LogLevel::Decision,
                "Not showing notification: no modes configured for this duration"
            );
            return report;
        }

        let descriptions: Vec<String> = rule.actions.iter().map(|a| a.to_string()).collect();
        vlog!(
            self.log,
            LogLevel::Lifecycle,
            "Showing notifications for duration {duration_secs:.1}s: [{}]",
            descriptions.join(", ")
        );

        for action in &rule.actions {
            report.outcomes.push(self.execute_action(action));
        }
        report
    }

    /// Execute a single action
    fn execute_action(&self, action: &NotificationAction) -> ActionOutcome {
        let label = action.to_string();

        if self.dry_run {
            vlog!(self.log, LogLevel::Decision, "Dry run, skipping {label}");
            return ActionOutcome {
                action: label,
                status: ExecutionStatus::Skipped {
                    reason: "dry-run mode".to_string(),
                },
            };
        }

        let status = match action {
            NotificationAction::Tone => match self.channels.play_tone(&ToneSpec::COMPLETION) {
                Ok(()) => {
                    vlog!(self.log, LogLevel::Decision, "Tone notification played");
                    ExecutionStatus::Success
                }
                Err(e) => {
                    vlog!(self.log, LogLevel::Lifecycle, "Error playing sound: {e}");
                    ExecutionStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            },
            NotificationAction::DesktopAlert => {
                let permission = self.channels.permission();
                if permission != Permission::Granted {
                    vlog!(
                        self.log,
                        LogLevel::Decision,
                        "Cannot show desktop notification: permission {permission}"
                    );
                    ExecutionStatus::Skipped {
                        reason: format!("notification permission {permission}"),
                    }
                } else {
                    vlog!(self.log, LogLevel::Decision, "Creating desktop notification");
                    match self.channels.show_alert(&AlertSpec::completion()) {
                        Ok(()) => {
                            vlog!(
                                self.log,
                                LogLevel::Decision,
                                "Desktop notification created successfully"
                            );
                            ExecutionStatus::Success
                        }
                        Err(e) => {
                            vlog!(
                                self.log,
                                LogLevel::Lifecycle,
                                "Error creating desktop notification: {e}"
                            );
                            ExecutionStatus::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            }
            NotificationAction::Speech(text) => match self.channels.speak(&Utterance::new(text.as_str())) {
                Ok(()) => {
                    vlog!(self.log, LogLevel::Decision, "Speech notification spoken: \"{text}\"");
                    ExecutionStatus::Success
                }
                Err(e) => {
                    vlog!(self.log, LogLevel::Lifecycle, "Error playing speech: {e}");
                    ExecutionStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        ActionOutcome {
            action: label,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ThresholdRule;
    use crate::error::ChannelError;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Tone,
        Alert(String),
        Speech(String),
        RequestPermission,
    }

    #[derive(Clone)]
    struct FakeChannels {
        calls: Arc<Mutex<Vec<Call>>>,
        focused: bool,
        permission: Permission,
        tone_fails: bool,
    }

    impl FakeChannels {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                focused: false,
                permission: Permission::Granted,
                tone_fails: false,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AlertChannels for FakeChannels {
        fn has_focus(&self) -> bool {
            self.focused
        }

        fn permission(&self) -> Permission {
            self.permission
        }

        fn request_permission(&mut self) -> Permission {
            self.calls.lock().unwrap().push(Call::RequestPermission);
            self.permission = Permission::Granted;
            self.permission
        }

        fn play_tone(&self, _tone: &ToneSpec) -> Result<(), ChannelError> {
            if self.tone_fails {
                return Err(ChannelError::Unsupported("audio"));
            }
            self.calls.lock().unwrap().push(Call::Tone);
            Ok(())
        }

        fn show_alert(&self, alert: &AlertSpec) -> Result<(), ChannelError> {
            self.calls.lock().unwrap().push(Call::Alert(alert.title.clone()));
            Ok(())
        }

        fn speak(&self, utterance: &Utterance) -> Result<(), ChannelError> {
            self.calls.lock().unwrap().push(Call::Speech(utterance.text.clone()));
            Ok(())
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            ThresholdRule {
                threshold_secs: 0.0,
                actions: vec![NotificationAction::Tone],
            },
            ThresholdRule {
                threshold_secs: 10.0,
                actions: vec![
                    NotificationAction::Tone,
                    NotificationAction::Speech("Long one done".into()),
                    NotificationAction::DesktopAlert,
                ],
            },
        ])
        .unwrap()
    }

    fn dispatcher(channels: &FakeChannels, only_if_not_in_focus: bool) -> NotificationDispatcher {
        NotificationDispatcher::with_rules(
            rules(),
            only_if_not_in_focus,
            Box::new(channels.clone()),
            Verbosity::VERY_DETAILED,
        )
    }

    #[test]
    fn test_short_duration_plays_only_tone() {
        let channels = FakeChannels::new();
        let report = dispatcher(&channels, false).dispatch(3.0);
        assert_eq!(channels.calls(), vec![Call::Tone]);
        assert_eq!(report.threshold_secs, Some(0.0));
        assert_eq!(report.success_count(), 1);
    }

    #[test]
    fn test_long_duration_runs_actions_in_order() {
        let channels = FakeChannels::new();
        dispatcher(&channels, false).dispatch(42.0);
        assert_eq!(
            channels.calls(),
            vec![
                Call::Tone,
                Call::Speech("Long one done".into()),
                Call::Alert("Response Complete".into()),
            ]
        );
    }

    #[test]
    fn test_focus_suppresses_everything() {
        let mut channels = FakeChannels::new();
        channels.focused = true;
        let report = dispatcher(&channels, true).dispatch(42.0);
        assert!(channels.calls().is_empty());
        assert_eq!(report.suppressed, Some(Suppression::PageInFocus));
    }

    #[test]
    fn test_focus_is_ignored_without_the_gate() {
        let mut channels = FakeChannels::new();
        channels.focused = true;
        dispatcher(&channels, false).dispatch(1.0);
        assert_eq!(channels.calls(), vec![Call::Tone]);
    }

    #[test]
    fn test_failing_tone_does_not_block_the_rest() {
        let mut channels = FakeChannels::new();
        channels.tone_fails = true;
        let report = dispatcher(&channels, false).dispatch(42.0);
        assert_eq!(
            channels.calls(),
            vec![
                Call::Speech("Long one done".into()),
                Call::Alert("Response Complete".into()),
            ]
        );
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.success_count(), 2);
    }

    #[test]
    fn test_alert_is_skipped_without_permission() {
        let mut channels = FakeChannels::new();
        channels.permission = Permission::Denied;
        let report = dispatcher(&channels, false).dispatch(42.0);
        assert!(!channels.calls().iter().any(|c| matches!(c, Call::Alert(_))));
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn test_alert_never_prompts_at_dispatch_time() {
        let mut channels = FakeChannels::new();
        channels.permission = Permission::Default;
        dispatcher(&channels, false).dispatch(42.0);
        assert!(!channels.calls().contains(&Call::RequestPermission));
    }

    #[test]
    fn test_permission_is_requested_only_when_undecided() {
        let mut channels = FakeChannels::new();
        channels.permission = Permission::Default;
        let mut d = dispatcher(&channels, false);
        assert_eq!(d.prepare_permission(), Permission::Granted);
        assert_eq!(channels.calls(), vec![Call::RequestPermission]);

        let denied = FakeChannels {
            permission: Permission::Denied,
            ..FakeChannels::new()
        };
        let mut d = dispatcher(&denied, false);
        assert_eq!(d.prepare_permission(), Permission::Denied);
        assert!(denied.calls().is_empty());
    }

    #[test]
    fn test_no_matching_rule_does_nothing() {
        let channels = FakeChannels::new();
        let d = NotificationDispatcher::with_rules(
            RuleSet::new(vec![ThresholdRule {
                threshold_secs: 10.0,
                actions: vec![NotificationAction::Tone],
            }])
            .unwrap(),
            false,
            Box::new(channels.clone()),
            Verbosity::SILENT,
        );
        let report = d.dispatch(4.0);
        assert!(channels.calls().is_empty());
        assert_eq!(report.suppressed, Some(Suppression::NoMatchingRule));
    }

    #[test]
    fn test_dry_run_skips_every_action() {
        let channels = FakeChannels::new();
        let report = dispatcher(&channels, false).dry_run().dispatch(42.0);
        assert!(channels.calls().is_empty());
        assert_eq!(report.skipped_count(), 3);
    }
}
