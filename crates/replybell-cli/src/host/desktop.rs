//! Alert channels backed by desktop tools.
//!
//! Alerts and speech shell out to the platform's notifier and speech
//! programs on a detached thread, so dispatch never waits for them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::thread;

use replybell_core::dispatch::{AlertChannels, AlertSpec, Permission, ToneSpec, Utterance};
use replybell_core::error::ChannelError;

use super::tone;

/// Answers "does the watched page have focus right now".
pub type FocusProbe = Arc<dyn Fn() -> bool + Send + Sync>;

#[cfg(target_os = "macos")]
const NOTIFIERS: &[&str] = &["osascript"];
#[cfg(not(target_os = "macos"))]
const NOTIFIERS: &[&str] = &["notify-send"];

#[cfg(target_os = "macos")]
const SPEAKERS: &[&str] = &["say"];
#[cfg(not(target_os = "macos"))]
const SPEAKERS: &[&str] = &["spd-say", "espeak"];

/// Locate an executable on `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let paths: OsString = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn first_available(programs: &[&'static str]) -> Option<&'static str> {
    programs.iter().copied().find(|p| find_program(p).is_some())
}

/// Run a command to completion on its own thread, logging failures.
fn spawn_detached(mut command: Command, what: &'static str) {
    thread::spawn(move || match command.output() {
        Ok(output) if output.status.success() => {
            tracing::debug!("{what} command finished");
        }
        Ok(output) => {
            tracing::warn!(
                "{what} command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(e) => {
            tracing::warn!("Failed to run {what} command: {e}");
        }
    });
}

fn alert_command(program: &str, alert: &AlertSpec) -> Command {
    let mut command = Command::new(program);
    if program == "osascript" {
        let script = format!(
            "display notification {:?} with title {:?}",
            alert.body, alert.title
        );
        command.arg("-e").arg(script);
    } else {
        command.arg("--app-name=replybell").arg(&alert.title).arg(&alert.body);
    }
    command
}

fn speech_command(program: &str, utterance: &Utterance) -> Command {
    let mut command = Command::new(program);
    match program {
        // spd-say takes -100..100 for each; 0 rate and pitch is the voice default.
        "spd-say" => {
            let rate = ((utterance.rate - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
            let pitch = ((utterance.pitch - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
            let volume = (utterance.volume * 200.0 - 100.0).round().clamp(-100.0, 100.0) as i32;
            command
                .arg("-r")
                .arg(rate.to_string())
                .arg("-p")
                .arg(pitch.to_string())
                .arg("-i")
                .arg(volume.to_string());
        }
        // Words per minute around 175, pitch 0..99 around 50, amplitude 0..200.
        "espeak" => {
            let wpm = (175.0 * utterance.rate).round() as u32;
            let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
            let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;
            command
                .arg("-s")
                .arg(wpm.to_string())
                .arg("-p")
                .arg(pitch.to_string())
                .arg("-a")
                .arg(amplitude.to_string());
        }
        // say has no pitch or volume flags; the system voice settings apply.
        _ => {
            let wpm = (175.0 * utterance.rate).round() as u32;
            command.arg("-r").arg(wpm.to_string());
        }
    }
    command.arg(&utterance.text);
    command
}

/// [`AlertChannels`] for a desktop session.
pub struct DesktopChannels {
    focus: FocusProbe,
    permission: Permission,
}

impl DesktopChannels {
    pub fn new(focus: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            focus: Arc::new(focus),
            permission: Permission::Default,
        }
    }
}

impl AlertChannels for DesktopChannels {
    fn has_focus(&self) -> bool {
        (self.focus)()
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    /// Granted when a notifier program is installed, denied otherwise.
    fn request_permission(&mut self) -> Permission {
        self.permission = match first_available(NOTIFIERS) {
            Some(program) => {
                tracing::debug!("Desktop notifications via {program}");
                Permission::Granted
            }
            None => Permission::Denied,
        };
        self.permission
    }

    fn play_tone(&self, spec: &ToneSpec) -> Result<(), ChannelError> {
        tone::play(spec)
    }

    fn show_alert(&self, alert: &AlertSpec) -> Result<(), ChannelError> {
        let program = first_available(NOTIFIERS).ok_or(ChannelError::Unsupported("desktop alerts"))?;
        spawn_detached(alert_command(program, alert), "notification");
        Ok(())
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), ChannelError> {
        let program = first_available(SPEAKERS).ok_or(ChannelError::Unsupported("speech synthesis"))?;
        spawn_detached(speech_command(program, utterance), "speech");
        Ok(())
    }
}
