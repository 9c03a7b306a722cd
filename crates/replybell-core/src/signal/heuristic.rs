//! Label-based busy heuristic.
//!
//! A page is busy while any control's label contains the stop pattern. A
//! disabled run control next to it does not matter. This leans on unstable
//! external markup, so nothing here assumes uniqueness or stable labels.

use super::{ChangeCallback, Control, HostPage, MutationObserver, SignalSource};
use crate::config::SignalConfig;
use crate::log::{ComponentLog, LogLevel, Verbosity};
use crate::vlog;

/// How a single control reads under the label patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Stop,
    Run,
}

/// [`SignalSource`] that classifies the host page's controls by label.
#[derive(Debug)]
pub struct ControlLabelSignal<P> {
    page: P,
    stop_label: String,
    run_label: String,
    log: ComponentLog,
}

impl<P: HostPage> ControlLabelSignal<P> {
    pub fn new(page: P, patterns: &SignalConfig, verbosity: Verbosity) -> Self {
        Self {
            page,
            stop_label: patterns.stop_label.clone(),
            run_label: patterns.run_label.clone(),
            log: ComponentLog::new("signal", verbosity),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Classify a label. Stop wins when both patterns occur.
    pub fn classify(&self, label: &str) -> Option<ControlKind> {
        let text = label.trim();
        if text.contains(self.stop_label.as_str()) {
            Some(ControlKind::Stop)
        } else if text.contains(self.run_label.as_str()) {
            Some(ControlKind::Run)
        } else {
            None
        }
    }

    fn log_diagnostics(&self, controls: &[Control]) {
        vlog!(self.log, LogLevel::Detail, "Found {} controls", controls.len());
        let mut run_or_stop = 0usize;
        let mut disabled_run = false;
        for control in controls {
            if let Some(kind) = self.classify(&control.label) {
                run_or_stop += 1;
                if kind == ControlKind::Run && control.disabled {
                    disabled_run = true;
                }
                vlog!(
                    self.log,
                    LogLevel::Detail,
                    "Found control: \"{}\", disabled: {}",
                    control.label.trim(),
                    control.disabled
                );
            }
        }
        vlog!(self.log, LogLevel::Detail, "Found {run_or_stop} Run/Stop controls");
        vlog!(
            self.log,
            LogLevel::Detail,
            "Disabled Run control found: {}",
            if disabled_run { "YES" } else { "NO" }
        );
    }
}

impl<P: HostPage> SignalSource for ControlLabelSignal<P> {
    fn sample(&self) -> bool {
        let controls = match self.page.query_controls() {
            Ok(controls) => controls,
            Err(e) => {
                vlog!(self.log, LogLevel::Lifecycle, "Control query failed, treating as idle: {e}");
                return false;
            }
        };

        if self.log.enabled(LogLevel::Detail) {
            self.log_diagnostics(&controls);
        }

        let stop = controls
            .iter()
            .find(|c| self.classify(&c.label) == Some(ControlKind::Stop));
        match stop {
            Some(control) => {
                vlog!(
                    self.log,
                    LogLevel::Detail,
                    "Stop control found: \"{}\"",
                    control.label.trim()
                );
                true
            }
            None => {
                vlog!(self.log, LogLevel::Detail, "Stop control found: NO");
                false
            }
        }
    }

    fn on_possible_change(&mut self, callback: ChangeCallback) {
        self.page.observe(MutationObserver::new(callback, self.log));
        vlog!(self.log, LogLevel::Decision, "Mutation observer started");
    }

    fn disconnect(&mut self) {
        self.page.disconnect();
        vlog!(self.log, LogLevel::Decision, "Mutation observer disconnected");
    }
}
