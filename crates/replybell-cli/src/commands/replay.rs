//! Scripted replay on simulated time.
//!
//! ```toml
//! [[steps]]
//! at_secs = 0.0
//! busy = true
//!
//! [[steps]]
//! at_secs = 12.5
//! controls = [{ label = "Run", disabled = true }]
//! focused = true
//! ```
//!
//! Each step moves the clock, updates the page, and evaluates once.

use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use replybell_core::dispatch::{AlertChannels, AlertSpec, Permission, ToneSpec, Utterance};
use replybell_core::error::ChannelError;
use replybell_core::signal::Control;
use replybell_core::{
    ControlLabelSignal, ManualClock, Monitor, NotificationDispatcher, ScriptedPage, StateTracker,
};
use tokio::sync::mpsc;

use super::{init_logging, load_config, print_record};
use crate::host::DesktopChannels;

#[derive(Args)]
pub struct ReplayArgs {
    /// Scenario file (TOML list of steps)
    scenario: PathBuf,
    /// Config file (defaults to the user config)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Actually fire notifications instead of a dry run
    #[arg(long)]
    live: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at_secs: f64,
    #[serde(default)]
    pub busy: Option<bool>,
    #[serde(default)]
    pub controls: Option<Vec<Control>>,
    #[serde(default)]
    pub focused: Option<bool>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), String> {
        let mut previous = 0.0;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.at_secs.is_finite() || step.at_secs < previous {
                return Err(format!(
                    "step {index}: at_secs must be finite and not earlier than the previous step"
                ));
            }
            if step.busy.is_some() && step.controls.is_some() {
                return Err(format!("step {index}: set either busy or controls, not both"));
            }
            previous = step.at_secs;
        }
        Ok(())
    }
}

/// Focus follows the scripted page; everything else goes to the desktop
/// when live.
struct ReplayChannels {
    page: ScriptedPage,
    live: Option<DesktopChannels>,
}

impl AlertChannels for ReplayChannels {
    fn has_focus(&self) -> bool {
        self.page.has_focus()
    }

    fn permission(&self) -> Permission {
        match &self.live {
            Some(live) => live.permission(),
            None => Permission::Granted,
        }
    }

    fn request_permission(&mut self) -> Permission {
        match &mut self.live {
            Some(live) => live.request_permission(),
            None => Permission::Granted,
        }
    }

    fn play_tone(&self, tone: &ToneSpec) -> Result<(), ChannelError> {
        self.live
            .as_ref()
            .ok_or(ChannelError::Unsupported("tone"))?
            .play_tone(tone)
    }

    fn show_alert(&self, alert: &AlertSpec) -> Result<(), ChannelError> {
        self.live
            .as_ref()
            .ok_or(ChannelError::Unsupported("desktop alerts"))?
            .show_alert(alert)
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), ChannelError> {
        self.live
            .as_ref()
            .ok_or(ChannelError::Unsupported("speech synthesis"))?
            .speak(utterance)
    }
}

pub fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    init_logging(config.verbosity);
    let scenario = Scenario::load(&args.scenario)?;

    let page = ScriptedPage::new();
    let clock = ManualClock::new();
    let focus = page.clone();
    let channels = ReplayChannels {
        page: page.clone(),
        live: args
            .live
            .then(|| DesktopChannels::new(move || focus.has_focus())),
    };

    let source = ControlLabelSignal::new(page.clone(), &config.signal, config.verbosity);
    let tracker = StateTracker::new(Box::new(source), Arc::new(clock.clone()), config.verbosity);
    let mut dispatcher = NotificationDispatcher::new(&config, Box::new(channels))?;
    if !args.live {
        dispatcher = dispatcher.dry_run();
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut monitor = Monitor::new(&config, tracker, dispatcher).with_sink(tx);
    monitor.start();

    for step in &scenario.steps {
        clock.set_secs(step.at_secs);
        if let Some(focused) = step.focused {
            page.set_focused(focused);
        }
        if let Some(busy) = step.busy {
            page.set_busy(busy);
        }
        if let Some(controls) = &step.controls {
            page.set_controls(controls.clone());
        }
        monitor.evaluate();
    }
    monitor.stop();

    while let Ok(record) = rx.try_recv() {
        print_record(&record)?;
    }
    Ok(())
}
