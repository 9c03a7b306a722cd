//! Notification action definitions.
//!
//! In config files an action is either a bare mode name or a speech table:
//! `"tone"`, `"desktop_alert"`, `{ speech = "text" }`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One thing to do when a generation finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum NotificationAction {
    /// Short synthesized tone.
    Tone,
    /// System-level notification with a fixed completion message.
    DesktopAlert,
    /// Speak the given text.
    Speech(String),
}

/// Config spelling of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawAction {
    Mode(String),
    Speech { speech: String },
}

impl TryFrom<RawAction> for NotificationAction {
    type Error = String;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        match raw {
            RawAction::Mode(name) => match name.as_str() {
                "tone" | "bell" => Ok(NotificationAction::Tone),
                "desktop_alert" | "desktop_notif" => Ok(NotificationAction::DesktopAlert),
                other => Err(format!(
                    "unknown notification mode '{other}' (expected \"tone\", \"desktop_alert\" or {{ speech = \"...\" }})"
                )),
            },
            RawAction::Speech { speech } => {
                if speech.trim().is_empty() {
                    Err("speech text must not be empty".to_string())
                } else {
                    Ok(NotificationAction::Speech(speech))
                }
            }
        }
    }
}

impl From<NotificationAction> for RawAction {
    fn from(action: NotificationAction) -> Self {
        match action {
            NotificationAction::Tone => RawAction::Mode("tone".into()),
            NotificationAction::DesktopAlert => RawAction::Mode("desktop_alert".into()),
            NotificationAction::Speech(speech) => RawAction::Speech { speech },
        }
    }
}

impl NotificationAction {
    /// Get the type name of this action
    pub fn type_name(&self) -> &'static str {
        match self {
            NotificationAction::Tone => "tone",
            NotificationAction::DesktopAlert => "desktop_alert",
            NotificationAction::Speech(_) => "speech",
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationAction::Speech(text) => write!(f, "speech:\"{text}\""),
            other => f.write_str(other.type_name()),
        }
    }
}
