//! Polling change monitor.
//!
//! A background thread snapshots modification times under a set of roots on a
//! fixed interval and hands every changed path to a callback:
//!
//! ```text
//! initial snapshot ──► sleep(interval) ──► snapshot ──► diff ──► callback(changes)
//!                          ▲                                          │
//!                          └──────────────────────────────────────────┘
//! ```
//!
//! Only new and modified files are reported; deletions are not. Files whose
//! metadata cannot be read are left out of the snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// File path → modification time.
pub type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Modification times of every file under `roots`. Missing roots contribute
/// nothing.
pub fn snapshot<P: AsRef<Path>>(roots: &[P]) -> Snapshot {
    let mut files = Snapshot::new();
    for root in roots {
        for entry in WalkDir::new(root.as_ref()).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
                files.insert(entry.into_path(), modified);
            }
        }
    }
    files
}

/// Entries of `current` that are absent from `previous` or carry a different
/// time.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Snapshot {
    current
        .iter()
        .filter(|(path, time)| previous.get(*path) != Some(*time))
        .map(|(path, time)| (path.clone(), *time))
        .collect()
}

/// Handle to a running monitor. Dropping it without calling
/// [`stop`](Self::stop) leaves the thread running.
pub struct MonitorHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the loop and wait for it to exit. A callback in progress
    /// finishes first.
    pub fn stop(self) {
        self.stop.send(()).ok();
        if self.thread.join().is_err() {
            tracing::warn!("change monitor thread panicked");
        }
    }
}

pub struct Monitor;

impl Monitor {
    /// Start polling `roots` every `interval`, calling `on_change` with each
    /// non-empty set of changes.
    pub fn spawn<F>(roots: Vec<PathBuf>, interval: Duration, mut on_change: F) -> MonitorHandle
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let thread = thread::spawn(move || {
            let mut known = snapshot(&roots);
            tracing::debug!(files = known.len(), "change monitor started");
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let changes = diff(&known, &snapshot(&roots));
                if changes.is_empty() {
                    continue;
                }
                tracing::debug!(changed = changes.len(), "source files changed");
                known.extend(changes.iter().map(|(p, t)| (p.clone(), *t)));
                on_change(&changes);
            }
            tracing::debug!("change monitor stopped");
        });
        MonitorHandle { stop, thread }
    }
}
