//! Alerting capabilities the host environment provides.
//!
//! Every call is fire-and-forget: implementations start the sound, alert or
//! utterance and return without waiting for it to finish.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ChannelError;

/// System notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        })
    }
}

/// Sine tone with an exponential gain decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_secs: f32,
    pub start_gain: f32,
    pub end_gain: f32,
}

impl ToneSpec {
    /// The completion tone: 800 Hz, 0.5 s, gain 0.3 decaying to 0.01.
    pub const COMPLETION: ToneSpec = ToneSpec {
        frequency_hz: 800.0,
        duration_secs: 0.5,
        start_gain: 0.3,
        end_gain: 0.01,
    };

    /// Gain at `t` seconds into the tone.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return self.start_gain;
        }
        if t >= self.duration_secs {
            return self.end_gain;
        }
        let progress = t / self.duration_secs;
        self.start_gain * (self.end_gain / self.start_gain).powf(progress)
    }
}

/// Title and body of a desktop alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSpec {
    pub title: String,
    pub body: String,
}

impl AlertSpec {
    pub fn completion() -> Self {
        Self {
            title: "Response Complete".into(),
            body: "The AI model has finished responding".into(),
        }
    }
}

/// Text to speak and how to speak it.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 1.2,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Alerting channels of the host environment.
pub trait AlertChannels: Send {
    /// Whether the watched page currently holds input focus.
    fn has_focus(&self) -> bool;

    fn permission(&self) -> Permission;

    /// Ask for desktop alert permission. Called at most once, at startup.
    fn request_permission(&mut self) -> Permission;

    fn play_tone(&self, tone: &ToneSpec) -> Result<(), ChannelError>;

    fn show_alert(&self, alert: &AlertSpec) -> Result<(), ChannelError>;

    fn speak(&self, utterance: &Utterance) -> Result<(), ChannelError>;
}
