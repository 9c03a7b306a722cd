//! Generation state tracker.
//!
//! A two-state machine over the sampled busy indicator. Like a timer engine
//! it owns no thread: the caller invokes [`StateTracker::evaluate`] whenever
//! a trigger fires, and gets back an event only on an edge.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Busy -> Idle
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::Event;
use crate::log::{ComponentLog, LogLevel, Verbosity};
use crate::signal::SignalSource;
use crate::vlog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Busy,
}

/// What the tracker remembers between evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationSession {
    pub active: bool,
    /// Clock reading (ms) of the idle -> busy edge.
    pub started_at_ms: Option<u64>,
}

pub struct StateTracker {
    source: Box<dyn SignalSource>,
    clock: Arc<dyn Clock>,
    session: GenerationSession,
    check_count: u64,
    log: ComponentLog,
}

impl StateTracker {
    pub fn new(source: Box<dyn SignalSource>, clock: Arc<dyn Clock>, verbosity: Verbosity) -> Self {
        Self {
            source,
            clock,
            session: GenerationSession::default(),
            check_count: 0,
            log: ComponentLog::new("tracker", verbosity),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        if self.session.active {
            SessionState::Busy
        } else {
            SessionState::Idle
        }
    }

    pub fn session(&self) -> GenerationSession {
        self.session
    }

    pub fn check_count(&self) -> u64 {
        self.check_count
    }

    pub fn source_mut(&mut self) -> &mut dyn SignalSource {
        self.source.as_mut()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Forget any in-flight generation. Does not sample.
    pub fn start(&mut self) {
        self.session = GenerationSession::default();
        self.check_count = 0;
    }

    /// Sample the indicator and advance the state machine.
    ///
    /// Returns `Some` only on an edge; an unchanged indicator is a no-op.
    pub fn evaluate(&mut self) -> Option<Event> {
        self.check_count += 1;
        let busy = self.source.sample();
        vlog!(
            self.log,
            LogLevel::Detail,
            "Check #{}: generating={}, was_generating={}",
            self.check_count,
            busy,
            self.session.active
        );

        match (self.session.active, busy) {
            (false, true) => {
                let now = self.clock.now_ms();
                self.session = GenerationSession {
                    active: true,
                    started_at_ms: Some(now),
                };
                vlog!(self.log, LogLevel::Lifecycle, "AI generation started");
                Some(Event::GenerationStarted { at: Utc::now() })
            }
            (true, false) => {
                let duration_secs = match self.session.started_at_ms {
                    Some(started) => self.clock.now_ms().saturating_sub(started) as f64 / 1000.0,
                    None => 0.0,
                };
                self.session = GenerationSession::default();
                vlog!(
                    self.log,
                    LogLevel::Lifecycle,
                    "AI generation completed in {duration_secs:.1}s"
                );
                Some(Event::GenerationFinished {
                    duration_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }
}
