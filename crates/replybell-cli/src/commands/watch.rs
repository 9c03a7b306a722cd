use clap::Args;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use replybell_core::error::Result;
use replybell_core::{
    Config, ControlLabelSignal, Monitor, MonitorHandle, MonitorRecord, MonotonicClock,
    NotificationDispatcher, StateTracker,
};
use tokio::sync::mpsc;

use super::{init_logging, load_config, print_record};
use crate::host::{DesktopChannels, SnapshotFile, SnapshotPage};

#[derive(Args)]
pub struct WatchArgs {
    /// Page snapshot JSON kept current by the browser bridge
    #[arg(long)]
    page: PathBuf,
    /// Config file (defaults to the user config)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Resolve and report, but do not fire any notification
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    init_logging(config.verbosity);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(args, config))
}

async fn watch(args: WatchArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let file = SnapshotFile::new(&args.page);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if !file.exists() {
        tracing::info!("Waiting for page snapshot at {}", file.path().display());
        let mut ticker = tokio::time::interval(config.monitor.poll_interval());
        loop {
            tokio::select! {
                _ = &mut ctrl_c => return Ok(()),
                _ = ticker.tick() => {
                    if file.exists() {
                        break;
                    }
                }
            }
        }
    }

    let focus = file.clone();
    let channels = DesktopChannels::new(move || focus.has_focus());
    let source = ControlLabelSignal::new(SnapshotPage::new(file), &config.signal, config.verbosity);
    let tracker = StateTracker::new(
        Box::new(source),
        Arc::new(MonotonicClock::new()),
        config.verbosity,
    );
    let mut dispatcher = NotificationDispatcher::new(&config, Box::new(channels))?;
    if args.dry_run {
        dispatcher = dispatcher.dry_run();
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut monitor = Monitor::new(&config, tracker, dispatcher).with_sink(tx);
    monitor.start();
    let handle = monitor.spawn();

    relay(handle, &mut rx, ctrl_c, print_record).await?;
    Ok(())
}

/// Emit records until `until` resolves or emitting fails. The monitor is
/// stopped either way; on a clean exit its final records are flushed too.
async fn relay<F>(
    handle: MonitorHandle,
    rx: &mut mpsc::UnboundedReceiver<MonitorRecord>,
    until: F,
    mut emit: impl FnMut(&MonitorRecord) -> Result<()>,
) -> Result<Monitor>
where
    F: Future,
{
    tokio::pin!(until);
    let mut failure = None;
    loop {
        tokio::select! {
            _ = &mut until => break,
            Some(record) = rx.recv() => {
                if let Err(e) = emit(&record) {
                    failure = Some(e);
                    break;
                }
            }
        }
    }

    let monitor = handle.stop().await?;
    if let Some(e) = failure {
        return Err(e);
    }
    while let Ok(record) = rx.try_recv() {
        emit(&record)?;
    }
    Ok(monitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use replybell_core::dispatch::{NotificationAction, RuleSet, ThresholdRule};
    use replybell_core::{CoreError, Event, ManualClock, ScriptedPage, Verbosity};

    fn spawned(page: &ScriptedPage) -> (MonitorHandle, mpsc::UnboundedReceiver<MonitorRecord>) {
        let mut config = Config::default();
        config.verbosity = Verbosity::SILENT;
        let source = ControlLabelSignal::new(page.clone(), &config.signal, config.verbosity);
        let tracker = StateTracker::new(
            Box::new(source),
            Arc::new(ManualClock::new()),
            config.verbosity,
        );
        let rules = RuleSet::new(vec![ThresholdRule {
            threshold_secs: 0.0,
            actions: vec![NotificationAction::Tone],
        }])
        .unwrap();
        let dispatcher = NotificationDispatcher::with_rules(
            rules,
            false,
            Box::new(DesktopChannels::new(|| false)),
            config.verbosity,
        )
        .dry_run();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut monitor = Monitor::new(&config, tracker, dispatcher).with_sink(tx);
        monitor.start();
        (monitor.spawn(), rx)
    }

    fn kind(record: &MonitorRecord) -> &'static str {
        match record {
            MonitorRecord::Event(Event::MonitorStarted { .. }) => "started",
            MonitorRecord::Event(Event::MonitorStopped { .. }) => "stopped",
            MonitorRecord::Event(_) => "event",
            MonitorRecord::Dispatch(_) => "dispatch",
        }
    }

    #[tokio::test]
    async fn test_emit_failure_still_stops_monitor() {
        let page = ScriptedPage::new();
        let (handle, mut rx) = spawned(&page);

        let result = relay(handle, &mut rx, std::future::pending::<()>(), |_| {
            Err(CoreError::Custom("stdout closed".to_string()))
        })
        .await;

        assert!(matches!(result, Err(CoreError::Custom(_))));
        assert!(!page.is_observed());
        let rest: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| kind(&r))
            .collect();
        assert_eq!(rest, ["stopped"]);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_final_records() {
        let page = ScriptedPage::new();
        let (handle, mut rx) = spawned(&page);
        let mut seen = Vec::new();

        relay(handle, &mut rx, tokio::task::yield_now(), |r| {
            seen.push(kind(r));
            Ok(())
        })
        .await
        .unwrap();

        assert!(!page.is_observed());
        assert_eq!(seen.first(), Some(&"started"));
        assert_eq!(seen.last(), Some(&"stopped"));
    }
}
