//! Verbosity-gated logging channel.
//!
//! Every component owns a [`ComponentLog`] carrying its name and the
//! configured verbosity. Lines are emitted as `[<component>] <message>`
//! through `tracing`, and only when `verbosity >= level`.
//!
//! ```ignore
//! use replybell_core::vlog;
//! use replybell_core::log::{ComponentLog, LogLevel, Verbosity};
//!
//! let log = ComponentLog::new("tracker", Verbosity::DETAILED);
//! vlog!(log, LogLevel::Decision, "matched threshold {}s", 10);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Log detail ceiling, 0 (silent) through 3 (per-poll detail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Verbosity(u8);

impl Verbosity {
    pub const SILENT: Verbosity = Verbosity(0);
    pub const MINIMAL: Verbosity = Verbosity(1);
    pub const DETAILED: Verbosity = Verbosity(2);
    pub const VERY_DETAILED: Verbosity = Verbosity(3);

    pub fn new(value: u8) -> Option<Self> {
        (value <= 3).then_some(Verbosity(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn allows(self, level: LogLevel) -> bool {
        self.0 >= level as u8
    }

    /// Directive for a `tracing_subscriber::EnvFilter` matching this verbosity.
    pub fn filter_directive(self) -> &'static str {
        match self.0 {
            0 => "off",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::MINIMAL
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Verbosity::new(value).ok_or_else(|| format!("verbosity must be 0-3, got {value}"))
    }
}

impl From<Verbosity> for u8 {
    fn from(v: Verbosity) -> Self {
        v.0
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Level a line requires before it is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Lifecycle and notable events
    Lifecycle = 1,
    /// Decisions and branch outcomes
    Decision = 2,
    /// Per-poll diagnostic detail
    Detail = 3,
}

/// Logging handle for one named component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentLog {
    component: &'static str,
    verbosity: Verbosity,
}

impl ComponentLog {
    pub fn new(component: &'static str, verbosity: Verbosity) -> Self {
        Self {
            component,
            verbosity,
        }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.verbosity.allows(level)
    }

    /// Emit one line. Prefer the [`vlog!`](crate::vlog) macro, which skips
    /// formatting when the level is gated off.
    pub fn emit(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let line = self.line(args);
        match level {
            LogLevel::Lifecycle => tracing::info!("{line}"),
            LogLevel::Decision => tracing::debug!("{line}"),
            LogLevel::Detail => tracing::trace!("{line}"),
        }
    }

    /// `[<component>] <message>`
    pub fn line(&self, args: fmt::Arguments<'_>) -> String {
        format!("[{}] {}", self.component, args)
    }
}

/// Verbosity-gated log line: `vlog!(log, LogLevel::Decision, "fmt", args..)`.
#[macro_export]
macro_rules! vlog {
    ($log:expr, $level:expr, $($arg:tt)*) => {
        if $log.enabled($level) {
            $log.emit($level, format_args!($($arg)*));
        }
    };
}
