//! Monitor lifecycle.
//!
//! The monitor owns the tracker and the dispatcher. Two producers feed it:
//! a poll interval and the signal source's change callback (each callback
//! schedules one delayed recheck). Both end up on a single consumer task,
//! so evaluations never overlap and the tracker needs no lock.
//!
//! ```ignore
//! let mut monitor = Monitor::new(&config, tracker, dispatcher);
//! monitor.start();
//! let handle = monitor.spawn();
//! // ...
//! let monitor = handle.stop().await?;
//! ```

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{Config, MonitorConfig};
use crate::dispatch::{DispatchReport, NotificationDispatcher};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::log::{ComponentLog, LogLevel, Verbosity};
use crate::tracker::StateTracker;
use crate::vlog;

/// Everything the monitor publishes, in order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MonitorRecord {
    Event(Event),
    Dispatch(DispatchReport),
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub event: Option<Event>,
    /// Present only when the event was a finished generation.
    pub report: Option<DispatchReport>,
}

pub struct Monitor {
    tracker: StateTracker,
    dispatcher: NotificationDispatcher,
    timing: MonitorConfig,
    verbosity: Verbosity,
    only_if_not_in_focus: bool,
    sink: Option<mpsc::UnboundedSender<MonitorRecord>>,
    log: ComponentLog,
}

impl Monitor {
    pub fn new(config: &Config, tracker: StateTracker, dispatcher: NotificationDispatcher) -> Self {
        Self {
            tracker,
            dispatcher,
            timing: config.monitor.clone(),
            verbosity: config.verbosity,
            only_if_not_in_focus: config.only_if_not_in_focus,
            sink: None,
            log: ComponentLog::new("monitor", config.verbosity),
        }
    }

    /// Publish every event and dispatch report to `sink`.
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<MonitorRecord>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    fn publish(&self, record: MonitorRecord) {
        if let Some(sink) = &self.sink {
            // A dropped receiver only means nobody is listening anymore.
            let _ = sink.send(record);
        }
    }

    /// Reset the session, settle permission, and announce the start.
    pub fn start(&mut self) -> Event {
        self.tracker.start();
        vlog!(
            self.log,
            LogLevel::Lifecycle,
            "Config loaded: verbosity={}, only_if_not_in_focus={}, thresholds={:?}",
            self.verbosity,
            self.only_if_not_in_focus,
            self.dispatcher.rules().thresholds()
        );
        let permission = self.dispatcher.prepare_permission();
        vlog!(self.log, LogLevel::Decision, "Notification permission: {permission}");
        vlog!(self.log, LogLevel::Lifecycle, "Monitor started");

        let event = Event::MonitorStarted { at: Utc::now() };
        self.publish(MonitorRecord::Event(event.clone()));
        event
    }

    /// Sample once, and dispatch if a generation just finished.
    pub fn evaluate(&mut self) -> Evaluation {
        let Some(event) = self.tracker.evaluate() else {
            return Evaluation::default();
        };
        self.publish(MonitorRecord::Event(event.clone()));

        let report = event.finished_duration().map(|duration| {
            let report = self.dispatcher.dispatch(duration);
            self.publish(MonitorRecord::Dispatch(report.clone()));
            report
        });
        Evaluation {
            event: Some(event),
            report,
        }
    }

    /// Disconnect from the page and announce the stop. Driven monitors call
    /// this directly; a spawned one goes through [`MonitorHandle::stop`].
    pub fn stop(&mut self) -> Event {
        self.tracker.source_mut().disconnect();
        vlog!(self.log, LogLevel::Lifecycle, "Monitor stopped");
        let event = Event::MonitorStopped { at: Utc::now() };
        self.publish(MonitorRecord::Event(event.clone()));
        event
    }

    /// Arm the poll timer and change listener on the current tokio runtime.
    ///
    /// Call [`start`](Self::start) first. The interval's first tick fires
    /// immediately, so the page is sampled once right away.
    pub fn spawn(mut self) -> MonitorHandle {
        let (recheck_tx, mut recheck_rx) = mpsc::unbounded_channel::<()>();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let runtime = tokio::runtime::Handle::current();
        let delay = self.timing.recheck_delay();
        let log = self.log;
        self.tracker.source_mut().on_possible_change(Arc::new(move || {
            vlog!(log, LogLevel::Detail, "Change reported, recheck in {}ms", delay.as_millis());
            let tx = recheck_tx.clone();
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(());
            });
        }));

        let period = self.timing.poll_interval();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.evaluate();
                    }
                    Some(()) = recheck_rx.recv() => {
                        vlog!(self.log, LogLevel::Detail, "Recheck after change");
                        self.evaluate();
                    }
                }
            }
            self
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Running monitor. Dropping it ends the loop but skips the disconnect and
/// the `MonitorStopped` event; use [`stop`](Self::stop).
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Monitor>,
}

impl MonitorHandle {
    /// Stop the loop and the timer, disconnect the observer, and hand the
    /// monitor back. An evaluation already in progress runs to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor task panicked.
    pub async fn stop(mut self) -> Result<Monitor> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let mut monitor = self
            .task
            .await
            .map_err(|e| CoreError::Custom(format!("monitor task failed: {e}")))?;
        monitor.stop();
        Ok(monitor)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
