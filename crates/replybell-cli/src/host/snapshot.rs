//! JSON page snapshot kept up to date by an external bridge.
//!
//! ```json
//! { "controls": [{ "label": "Stop", "disabled": false }], "focused": false }
//! ```
//!
//! A watcher thread polls the file's modification time and length and
//! reports each change as a child-list mutation.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use replybell_core::error::QueryError;
use replybell_core::signal::{Control, HostPage, Mutation, MutationObserver};

/// How often the watcher thread stats the file.
const WATCH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default)]
    pub focused: bool,
}

/// Read access to the snapshot file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> Result<PageSnapshot, QueryError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| QueryError::Unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&content).map_err(|e| QueryError::Malformed(e.to_string()))
    }

    /// Focus as last written by the bridge; unreadable means unfocused.
    pub fn has_focus(&self) -> bool {
        self.read().map(|s| s.focused).unwrap_or(false)
    }

    fn stamp(&self) -> Option<(SystemTime, u64)> {
        let meta = std::fs::metadata(&self.path).ok()?;
        Some((meta.modified().ok()?, meta.len()))
    }
}

struct Watcher {
    stop: Arc<AtomicBool>,
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// [`HostPage`] backed by a [`SnapshotFile`].
pub struct SnapshotPage {
    file: SnapshotFile,
    watcher: Option<Watcher>,
}

impl SnapshotPage {
    pub fn new(file: SnapshotFile) -> Self {
        Self {
            file,
            watcher: None,
        }
    }

    pub fn file(&self) -> &SnapshotFile {
        &self.file
    }
}

impl HostPage for SnapshotPage {
    fn query_controls(&self) -> Result<Vec<Control>, QueryError> {
        Ok(self.file.read()?.controls)
    }

    fn observe(&mut self, observer: MutationObserver) {
        self.disconnect();

        let stop = Arc::new(AtomicBool::new(false));
        let file = self.file.clone();
        let flag = Arc::clone(&stop);
        // Baseline before returning, so a write right after observe() still fires.
        let mut last = file.stamp();
        let spawned = thread::Builder::new()
            .name("snapshot-watcher".to_string())
            .spawn(move || {
                while !flag.load(Ordering::SeqCst) {
                    thread::sleep(WATCH_INTERVAL);
                    let current = file.stamp();
                    if current != last {
                        last = current;
                        observer.notify(&[Mutation::ChildList]);
                    }
                }
            });

        match spawned {
            Ok(_) => self.watcher = Some(Watcher { stop }),
            Err(e) => tracing::warn!("Failed to start snapshot watcher: {e}"),
        }
    }

    fn disconnect(&mut self) {
        // Dropping the watcher signals its thread; it exits on its next wake.
        self.watcher = None;
    }
}
