//! FileSystem Actor
//!
//! Watches the configured paths and sends debounced, classified change
//! events to the ReloadActor. The watcher config file gets special
//! treatment: a change to it never reaches the classifier - it reloads the
//! config, restarts the watcher with the new file set, and announces the
//! reconfiguration downstream.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → events → ReloadMsg
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::messages::ReloadMsg;
use crate::config::{WatchConfig, cfg, reload_config};
use crate::core::FileInfo;
use crate::reload::{ChangeKind, FileChangeEvent};
use crate::utils::path::{normalize_path, project_relative};

/// Check if path is a temp/backup file (editor artifacts)
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Bridged notify events (sync -> async)
    async_rx: mpsc::Receiver<notify::Event>,
    /// Sender side, kept for watcher restarts
    async_tx: mpsc::Sender<notify::Event>,
    /// Watcher handle (replaced on config reload)
    watcher: RecommendedWatcher,
    /// Channel to the ReloadActor
    reload_tx: mpsc::Sender<ReloadMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor watching the configured paths.
    ///
    /// The watcher starts immediately; failure to start it is fatal to
    /// server startup.
    pub fn new(reload_tx: mpsc::Sender<ReloadMsg>) -> notify::Result<Self> {
        let (async_tx, async_rx) = mpsc::channel::<notify::Event>(64);
        let config = cfg();
        let watcher = start_watcher(&config, async_tx.clone())?;

        Ok(Self {
            async_rx,
            async_tx,
            watcher,
            reload_tx,
            debouncer: Debouncer::new(config.watch.debounce_ms),
        })
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(event) = self.async_rx.recv() => self.debouncer.add_event(&event),
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    if self.process_changes().await.is_err() {
                        break; // ReloadActor shut down
                    }
                }
            }
        }
    }

    /// Process debounced file changes
    ///
    /// Returns `Err(())` if the ReloadActor shut down
    async fn process_changes(&mut self) -> Result<(), ()> {
        // Must be serving to process events (check BEFORE taking to
        // preserve events buffered during startup)
        if !crate::core::is_serving() {
            return Ok(());
        }

        let Some(mut changes) = self.debouncer.take_if_ready() else {
            return Ok(());
        };

        reconcile_with_disk(&mut changes);

        let config = cfg();

        // Watcher config change never reaches the classifier
        let config_path = normalize_path(&config.config_path);
        if changes.remove(&config_path).is_some() {
            self.handle_config_change().await?;
        }

        let events = build_events(changes, &cfg());
        if events.is_empty() {
            return Ok(());
        }

        for event in &events {
            crate::log!("watch"; "{}: {}", event.kind.label(), event.path);
        }

        self.reload_tx
            .send(ReloadMsg::Changes(events))
            .await
            .map_err(|_| ())
    }

    /// Reload config, restart the watcher over the new file set, and tell
    /// the ReloadActor to reset state and re-announce to clients.
    async fn handle_config_change(&mut self) -> Result<(), ()> {
        match reload_config() {
            Ok(true) => {
                crate::log!("watch"; "config reloaded, restarting watcher");
                let config = cfg();
                match start_watcher(&config, self.async_tx.clone()) {
                    Ok(watcher) => self.watcher = watcher,
                    Err(e) => crate::log!("error"; "watcher restart failed: {}", e),
                }
                self.debouncer.debounce_ms = config.watch.debounce_ms;
                self.reload_tx
                    .send(ReloadMsg::ConfigReloaded)
                    .await
                    .map_err(|_| ())?;
            }
            Ok(false) => {
                crate::debug!("watch"; "config file touched but unchanged");
            }
            Err(e) => {
                crate::log!("error"; "config reload failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Start a notify watcher over the configured paths, bridging its sync
/// callback into the async channel.
///
/// The previous watcher (if any) is simply dropped by the caller; its
/// bridge thread exits when the sync channel disconnects.
fn start_watcher(
    config: &WatchConfig,
    async_tx: mpsc::Sender<notify::Event>,
) -> notify::Result<RecommendedWatcher> {
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;

    // Watch configured paths (skip non-existent ones)
    for entry in config.watch.watch_paths() {
        let path = config.root.join(entry);
        if path.exists() {
            watcher.watch(&path, RecursiveMode::Recursive)?;
        }
    }

    // Watch the config file itself for hot reconfiguration
    if config.config_path.is_file() {
        watcher.watch(&config.config_path, RecursiveMode::NonRecursive)?;
    }

    // Bridge thread: sync notify channel -> async actor channel
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if async_tx.blocking_send(event).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    Ok(watcher)
}

/// Reconcile event kinds with actual filesystem state.
///
/// The watcher may report stale events (e.g., Added for a file that's
/// already been deleted, or Deleted for a file that still exists after an
/// atomic save).
fn reconcile_with_disk(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
    let paths: Vec<_> = changes.keys().cloned().collect();
    for path in paths {
        let kind = changes[&path];
        let exists = path.exists();
        match kind {
            ChangeKind::Added if !exists => {
                crate::debug!("watch"; "discard added (gone): {}", path.display());
                changes.remove(&path);
            }
            ChangeKind::Changed if !exists => {
                crate::debug!("watch"; "upgrade changed->deleted: {}", path.display());
                changes.insert(path, ChangeKind::Deleted);
            }
            ChangeKind::Deleted if exists => {
                crate::debug!("watch"; "downgrade deleted->changed: {}", path.display());
                changes.insert(path, ChangeKind::Changed);
            }
            _ => {}
        }
    }
}

/// Convert debounced raw changes into classified change events.
fn build_events(
    changes: FxHashMap<PathBuf, ChangeKind>,
    config: &WatchConfig,
) -> Vec<FileChangeEvent> {
    let mut events = Vec::new();

    for (path, kind) in changes {
        // Directories only matter through the files inside them
        if kind != ChangeKind::Deleted && !path.is_file() {
            continue;
        }

        let relative = project_relative(&path, &config.root);
        if config.watch.is_ignored(&relative) {
            continue;
        }

        let info = match kind {
            ChangeKind::Deleted => FileInfo::removed(&relative, &config.types),
            _ => FileInfo::probe(&relative, &config.root, &config.types),
        };

        events.push(FileChangeEvent {
            kind,
            path: relative,
            info,
        });
    }

    events
}

// =============================================================================
// Debouncer - Pure timing and event deduplication
// =============================================================================

/// Pure debouncer: only handles timing and event deduplication.
/// No business logic, no global state access.
struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<std::time::Instant>,
    debounce_ms: u64,
}

impl Debouncer {
    fn new(debounce_ms: u64) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            debounce_ms,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Deleted + Added/Changed → Added/Changed (file was restored)
    /// - Changed + Deleted → Deleted (file was deleted)
    /// - Added + Deleted → discarded (net no-op)
    /// - Same type events: first event wins
    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Added,
            EventKind::Remove(_) => ChangeKind::Deleted,
            EventKind::Modify(modify) => {
                // Ignore metadata-only changes (mtime/atime/chmod noise)
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Changed
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Deleted, ChangeKind::Added | ChangeKind::Changed) => {
                        crate::debug!("watch"; "restore {}->{}: {}",
                            existing.label(), kind.label(), path.display());
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Changed, ChangeKind::Deleted) => {
                        crate::debug!("watch"; "upgrade changed->deleted: {}", path.display());
                        self.changes.insert(path, ChangeKind::Deleted);
                    }
                    (ChangeKind::Added, ChangeKind::Deleted) => {
                        crate::debug!("watch"; "discard added+deleted: {}", path.display());
                        self.changes.remove(&path);
                    }
                    _ => {
                        // Same kind or Added+Changed: first event wins
                        continue;
                    }
                }
                self.last_event = Some(std::time::Instant::now());
                continue;
            }

            self.changes.insert(path, kind);
            self.last_event = Some(std::time::Instant::now());
        }
    }

    /// Take raw events if the debounce window elapsed.
    fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        (!changes.is_empty()).then_some(changes)
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        last_event.elapsed() >= Duration::from_millis(self.debounce_ms) && !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        Duration::from_millis(self.debounce_ms)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.into_iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn modify_kind() -> notify::EventKind {
        notify::EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Any,
        ))
    }

    fn create_kind() -> notify::EventKind {
        notify::EventKind::Create(notify::event::CreateKind::File)
    }

    fn remove_kind() -> notify::EventKind {
        notify::EventKind::Remove(notify::event::RemoveKind::File)
    }

    #[test]
    fn test_debouncer_empty() {
        let debouncer = Debouncer::new(300);
        assert!(!debouncer.is_ready());
    }

    #[test]
    fn test_event_routing_by_kind() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/a.css"], create_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/b.css"], modify_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/c.css"], remove_kind()));

        assert_eq!(debouncer.changes.len(), 3);
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/a.css")],
            ChangeKind::Added
        );
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/b.css")],
            ChangeKind::Changed
        );
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/c.css")],
            ChangeKind::Deleted
        );
    }

    #[test]
    fn test_temp_file_ignored() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/real.css"], modify_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/.index.css.swp"], modify_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/old.bak"], modify_kind()));

        assert_eq!(debouncer.changes.len(), 1);
    }

    #[test]
    fn test_dedup_first_event_wins() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));

        assert_eq!(debouncer.changes.len(), 1);
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/a.js")],
            ChangeKind::Added
        );
    }

    #[test]
    fn test_delete_then_create_restores() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));

        assert_eq!(debouncer.changes.len(), 1);
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/a.js")],
            ChangeKind::Added
        );
    }

    #[test]
    fn test_create_then_delete_discards() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));

        assert!(debouncer.changes.is_empty());
    }

    #[test]
    fn test_modify_then_delete_upgrades() {
        let mut debouncer = Debouncer::new(300);

        debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));
        debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));

        assert_eq!(debouncer.changes.len(), 1);
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/a.js")],
            ChangeKind::Deleted
        );
    }

    #[test]
    fn test_sleep_duration_no_events() {
        let debouncer = Debouncer::new(300);
        assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
    }

    #[test]
    fn test_sleep_duration_after_event() {
        let mut debouncer = Debouncer::new(300);
        debouncer.last_event = Some(std::time::Instant::now());

        let dur = debouncer.sleep_duration();
        assert!(dur >= Duration::from_millis(290));
        assert!(dur <= Duration::from_millis(310));
    }

    #[test]
    fn test_reconcile_discards_vanished_add() {
        let mut changes = FxHashMap::default();
        changes.insert(PathBuf::from("/nonexistent/x.css"), ChangeKind::Added);
        reconcile_with_disk(&mut changes);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_reconcile_upgrades_vanished_change() {
        let mut changes = FxHashMap::default();
        changes.insert(PathBuf::from("/nonexistent/x.css"), ChangeKind::Changed);
        reconcile_with_disk(&mut changes);
        assert_eq!(
            changes[&PathBuf::from("/nonexistent/x.css")],
            ChangeKind::Deleted
        );
    }

    #[test]
    fn test_build_events_skips_ignored() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/x.js"), "x").unwrap();
        std::fs::write(dir.path().join("app.js"), "x").unwrap();

        let mut config = WatchConfig::default();
        config.root = dir.path().to_path_buf();

        let mut changes = FxHashMap::default();
        changes.insert(dir.path().join("node_modules/x.js"), ChangeKind::Changed);
        changes.insert(dir.path().join("app.js"), ChangeKind::Changed);

        let events = build_events(changes, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, "app.js");
    }
}
