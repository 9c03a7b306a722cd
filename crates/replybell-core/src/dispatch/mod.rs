//! Duration-based notification dispatch.
//!
//! A finished generation's duration selects one threshold rule; the rule's
//! actions run in order through the host's [`AlertChannels`].

pub mod action;
pub mod channels;
pub mod dispatcher;
pub mod report;
pub mod rules;

pub use action::NotificationAction;
pub use channels::{AlertChannels, AlertSpec, Permission, ToneSpec, Utterance};
pub use dispatcher::NotificationDispatcher;
pub use report::{ActionOutcome, DispatchReport, ExecutionStatus, Suppression};
pub use rules::{RuleSet, ThresholdRule};
