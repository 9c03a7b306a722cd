//! Busy/idle signal detection.
//!
//! The host page is an external collaborator. It only has to answer two
//! things: "what controls are on the page right now" ([`HostPage::query_controls`])
//! and "tell me when the page changes" ([`HostPage::observe`]). Everything
//! that decides what those controls *mean* lives behind [`SignalSource`], so
//! the label heuristic can be swapped without touching the state machine.

mod heuristic;
mod scripted;

pub use heuristic::{ControlKind, ControlLabelSignal};
pub use scripted::ScriptedPage;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::QueryError;
use crate::log::{ComponentLog, LogLevel};
use crate::vlog;

/// Attribute names whose changes may flip the indicator.
pub const OBSERVED_ATTRIBUTES: [&str; 2] = ["disabled", "aria-label"];

/// One button-like control as currently rendered by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Visible label text.
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Control {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }

    pub fn disabled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: true,
        }
    }
}

/// A single structural change reported by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    Attributes {
        #[serde(rename = "attributeName", default)]
        attribute_name: Option<String>,
    },
    ChildList,
    CharacterData,
}

impl Mutation {
    pub fn attribute(name: impl Into<String>) -> Self {
        Mutation::Attributes {
            attribute_name: Some(name.into()),
        }
    }

    /// Whether this change could alter the busy indicator.
    pub fn may_affect_indicator(&self) -> bool {
        match self {
            Mutation::Attributes { attribute_name } => attribute_name
                .as_deref()
                .is_some_and(|name| OBSERVED_ATTRIBUTES.contains(&name)),
            Mutation::ChildList | Mutation::CharacterData => true,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Attributes { attribute_name } => write!(
                f,
                "type=attributes, attribute={}",
                attribute_name.as_deref().unwrap_or("none")
            ),
            Mutation::ChildList => write!(f, "type=childList"),
            Mutation::CharacterData => write!(f, "type=characterData"),
        }
    }
}

/// Callback fired when the page may have changed. Callers must re-sample;
/// the callback carries no payload.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Filters mutation batches down to "possibly relevant" and fires a callback.
///
/// Hosts hold a clone and call [`notify`](Self::notify) for every batch they
/// see. Over-triggering is fine; under-triggering only costs latency until
/// the next poll.
#[derive(Clone)]
pub struct MutationObserver {
    callback: ChangeCallback,
    log: ComponentLog,
}

impl MutationObserver {
    pub fn new(callback: ChangeCallback, log: ComponentLog) -> Self {
        Self { callback, log }
    }

    /// Report a batch of mutations. Returns whether the callback fired.
    pub fn notify(&self, batch: &[Mutation]) -> bool {
        vlog!(
            self.log,
            LogLevel::Detail,
            "MutationObserver triggered with {} mutations",
            batch.len()
        );
        let mut should_check = false;
        for (index, mutation) in batch.iter().enumerate() {
            vlog!(self.log, LogLevel::Detail, "Mutation {index}: {mutation}");
            if mutation.may_affect_indicator() {
                should_check = true;
            }
        }
        if should_check {
            vlog!(self.log, LogLevel::Detail, "Triggering state check from mutation");
            (self.callback)();
        }
        should_check
    }
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("component", &self.log.component())
            .finish_non_exhaustive()
    }
}

/// The host environment's page, as far as signal detection is concerned.
pub trait HostPage: Send {
    /// Current button-like controls. Must not panic; report failures as errors.
    fn query_controls(&self) -> Result<Vec<Control>, QueryError>;

    /// Start reporting mutation batches to `observer`. Replaces any previous observer.
    fn observe(&mut self, observer: MutationObserver);

    /// Stop reporting mutations.
    fn disconnect(&mut self);
}

/// Source of the derived busy/idle indicator.
pub trait SignalSource: Send {
    /// `true` iff the page currently shows a generation in progress.
    /// Never fails: any query problem reads as "not busy".
    fn sample(&self) -> bool;

    /// Register for best-effort "something may have changed" notifications.
    fn on_possible_change(&mut self, callback: ChangeCallback);

    /// Detach the change listener.
    fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Verbosity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_observer() -> (MutationObserver, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        let observer = MutationObserver::new(
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
            ComponentLog::new("signal", Verbosity::SILENT),
        );
        (observer, count)
    }

    #[test]
    fn test_attribute_filter_only_passes_observed_names() {
        assert!(Mutation::attribute("disabled").may_affect_indicator());
        assert!(Mutation::attribute("aria-label").may_affect_indicator());
        assert!(!Mutation::attribute("class").may_affect_indicator());
        assert!(!Mutation::Attributes { attribute_name: None }.may_affect_indicator());
    }

    #[test]
    fn test_content_changes_always_pass() {
        assert!(Mutation::ChildList.may_affect_indicator());
        assert!(Mutation::CharacterData.may_affect_indicator());
    }

    #[test]
    fn test_observer_fires_once_per_relevant_batch() {
        let (observer, count) = counting_observer();
        let fired = observer.notify(&[
            Mutation::attribute("class"),
            Mutation::ChildList,
            Mutation::attribute("disabled"),
        ]);
        assert!(fired);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_ignores_irrelevant_batch() {
        let (observer, count) = counting_observer();
        assert!(!observer.notify(&[Mutation::attribute("style")]));
        assert!(!observer.notify(&[]));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mutation_deserializes_from_dom_shape() {
        let m: Mutation =
            serde_json::from_str(r#"{"type":"attributes","attributeName":"disabled"}"#).unwrap();
        assert_eq!(m, Mutation::attribute("disabled"));
        let m: Mutation = serde_json::from_str(r#"{"type":"childList"}"#).unwrap();
        assert_eq!(m, Mutation::ChildList);
    }
}
