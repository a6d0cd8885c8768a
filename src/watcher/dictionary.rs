//! Watcher that keeps dictionary indexes in step with files on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::dictionary::UpdateOutcome;
use crate::source::DictionarySource;

use super::error::WatchError;
use super::path_registry::PathRegistry;

/// How often settled changes are flushed and the watch set re-read.
const TICK: Duration = Duration::from_millis(100);

/// Changes seen for one dictionary since its last refresh.
#[derive(Debug, Clone, Copy)]
struct PendingChange {
    last_seen: Instant,
    events: u32,
}

/// Dictionaries that changed on disk, keyed by configured path.
///
/// A dictionary is due once no event has arrived for it for `settle`.
/// Editors tend to write a file several times per save, so each refresh
/// covers a burst of events.
#[derive(Debug)]
struct ChangeQueue {
    changes: IndexMap<PathBuf, PendingChange>,
    settle: Duration,
}

impl ChangeQueue {
    fn new(settle: Duration) -> Self {
        Self {
            changes: IndexMap::new(),
            settle,
        }
    }

    fn note(&mut self, path: PathBuf, at: Instant) {
        let change = self.changes.entry(path).or_insert(PendingChange {
            last_seen: at,
            events: 0,
        });
        change.last_seen = at;
        change.events += 1;
    }

    fn forget(&mut self, path: &Path) {
        self.changes.shift_remove(path);
    }

    /// Remove and return settled dictionaries in first-changed order,
    /// each with the number of events it absorbed.
    fn take_settled(&mut self, now: Instant) -> Vec<(PathBuf, u32)> {
        let mut settled = Vec::new();
        self.changes.retain(|path, change| {
            if now.saturating_duration_since(change.last_seen) >= self.settle {
                settled.push((path.clone(), change.events));
                false
            } else {
                true
            }
        });
        settled
    }
}

/// Re-runs the freshness check for a dictionary after it changes.
///
/// The watch set is read from the [`DictionarySource`] on every tick, so a
/// later activation with different paths is picked up without restarting
/// the watcher.
pub struct DictionaryWatcher {
    source: Arc<DictionarySource>,
    registry: PathRegistry,
    queue: ChangeQueue,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watcher: notify::RecommendedWatcher,
    workspace_root: PathBuf,
}

impl DictionaryWatcher {
    /// Create a watcher for `source`, resolving relative dictionary paths
    /// against the current directory.
    pub fn new(source: Arc<DictionarySource>, debounce_ms: u64) -> Result<Self, WatchError> {
        let workspace_root = std::env::current_dir().map_err(|e| WatchError::InitFailed {
            reason: format!("cannot determine current directory: {e}"),
        })?;

        let (tx, rx) = mpsc::channel(100);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(Self {
            source,
            registry: PathRegistry::new(),
            queue: ChangeQueue::new(Duration::from_millis(debounce_ms)),
            event_rx: rx,
            watcher,
            workspace_root,
        })
    }

    /// Resolve relative dictionary paths against `root` instead.
    pub fn workspace_root(mut self, root: PathBuf) -> Self {
        self.workspace_root = root;
        self
    }

    /// Run the event loop.
    ///
    /// Returns only if the notify channel closes.
    pub async fn watch(mut self) -> Result<(), WatchError> {
        self.sync_watch_set();
        crate::log_event!("watcher", "started");

        // One ticker for the whole loop: events must not postpone it, or a
        // busy directory would starve settled dictionaries.
        let mut ticker = interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                res = self.event_rx.recv() => {
                    match res {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                        None => return Err(WatchError::ChannelClosed),
                    }
                }

                _ = ticker.tick() => {
                    self.sync_watch_set();
                    for (path, events) in self.queue.take_settled(Instant::now()) {
                        refresh(&self.source, &path, events).await;
                    }
                }
            }
        }
    }

    /// Rebuild the registry if the source's watch set changed.
    fn sync_watch_set(&mut self) {
        let paths = self.source.watch_paths();
        if self.registry.path_count() > 0 && self.registry.is_built_from(&paths) {
            return;
        }
        if paths.is_empty() && self.registry.path_count() == 0 {
            return;
        }

        for dir in self.registry.rebuild(&self.workspace_root, &paths) {
            if let Err(e) = self.watch_directory(&dir) {
                tracing::warn!("[watcher] {e}");
            }
        }
        crate::log_event!(
            "watcher",
            "monitoring",
            "{} dictionaries in {} directories",
            self.registry.path_count(),
            self.registry.dir_count()
        );
    }

    fn watch_directory(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", dir.display());
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let now = Instant::now();
        for path in &event.paths {
            let Some(configured) = self.registry.lookup(path) else {
                continue;
            };
            let configured = configured.to_path_buf();

            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) => {
                    self.queue.note(configured, now);
                }
                EventKind::Remove(_) => {
                    // The cached index stays searchable until the file returns.
                    self.queue.forget(&configured);
                    crate::log_event!("watcher", "deleted", "{}", configured.display());
                }
                _ => {}
            }
        }
    }
}

async fn refresh(source: &DictionarySource, path: &Path, events: u32) {
    match source.refresh(path).await {
        Ok(Some(UpdateOutcome::Rebuilt { words })) => {
            crate::log_event!(
                "watcher",
                "reindexed",
                "{} ({words} words, {events} events)",
                path.display()
            );
        }
        Ok(Some(_)) => {
            crate::debug_event!("watcher", "unchanged", "{}", path.display());
        }
        Ok(None) => {
            crate::debug_event!("watcher", "no longer watched", "{}", path.display());
        }
        Err(e) => {
            tracing::warn!("[watcher] refresh failed for {}: {e}", path.display());
        }
    }
}
