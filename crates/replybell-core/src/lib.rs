//! # replybell core library
//!
//! Watches a host page for an AI response being generated and, when the
//! generation ends, fires notifications chosen by how long it took.
//!
//! ## Architecture
//!
//! - **Signal**: derives a busy/idle indicator from the host page's controls
//! - **Tracker**: a two-state machine over the indicator; emits an event on
//!   each edge and measures the generation's duration
//! - **Dispatch**: maps the duration to threshold rules and runs the tone,
//!   desktop alert and speech actions
//! - **Monitor**: owns the above and drives them from a poll timer and the
//!   page's change notifications
//!
//! ## Key Components
//!
//! - [`Monitor`]: lifecycle owner (start, evaluate, spawn, stop)
//! - [`StateTracker`]: busy/idle state machine
//! - [`NotificationDispatcher`]: duration-based action dispatch
//! - [`Config`]: TOML configuration
//! - [`HostPage`] / [`AlertChannels`]: what the host environment provides

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod log;
pub mod monitor;
pub mod signal;
pub mod tracker;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Config, MonitorConfig, SignalConfig};
pub use dispatch::{
    AlertChannels, DispatchReport, NotificationAction, NotificationDispatcher, Permission, RuleSet,
};
pub use error::{ChannelError, ConfigError, CoreError, QueryError};
pub use events::Event;
pub use log::{ComponentLog, LogLevel, Verbosity};
pub use monitor::{Evaluation, Monitor, MonitorHandle, MonitorRecord};
pub use signal::{Control, ControlLabelSignal, HostPage, ScriptedPage, SignalSource};
pub use tracker::{SessionState, StateTracker};
