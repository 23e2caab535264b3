//! Shared fakes for the engine integration tests.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use filesync_engine::{
    EngineConfig, FileEventKind, FileStamp, FileSystem, LocalFileSystem, Notifier, Result,
    RetryPolicy, SettingsStore, SyncEngine, SyncNotification, SyncRule, SyncSettings, WatchGuard,
    WatchSink, WatchSource,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Watch source whose events are raised by the test.
#[derive(Default)]
pub struct ManualWatchSource {
    sinks: Mutex<Vec<(PathBuf, WatchSink)>>,
    subscriptions: AtomicUsize,
}

impl ManualWatchSource {
    /// Number of watches ever requested.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Deliver an event to every watch whose root contains `path`.
    /// Returns how many watches accepted it.
    pub fn raise(&self, kind: FileEventKind, path: &Path) -> usize {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .filter(|(root, _)| path.starts_with(root))
            .filter(|(_, sink)| sink.emit(kind, path))
            .count()
    }
}

impl WatchSource for ManualWatchSource {
    fn watch(&self, root: &Path, sink: WatchSink) -> Result<WatchGuard> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().push((root.to_path_buf(), sink));
        Ok(Box::new(()))
    }
}

/// Local disk with copy and enumeration counters.
#[derive(Default)]
pub struct CountingFs {
    inner: LocalFileSystem,
    pub copies: AtomicUsize,
    pub enumerations: AtomicUsize,
}

impl CountingFs {
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

impl FileSystem for CountingFs {
    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }

    fn stamp(&self, path: &Path) -> io::Result<FileStamp> {
        self.inner.stamp(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        self.inner.copy(from, to)
    }

    fn enumerate(&self, root: &Path, filter: &str) -> io::Result<Vec<PathBuf>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.inner.enumerate(root, filter)
    }
}

/// In-memory tree of `files_per_filter` files per enumeration, each copy
/// taking `copy_delay`.
pub struct SlowFs {
    pub files_per_filter: usize,
    pub copy_delay: Duration,
    pub enumerations: AtomicUsize,
}

impl SlowFs {
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl FileSystem for SlowFs {
    fn file_exists(&self, _path: &Path) -> bool {
        false
    }

    fn stamp(&self, _path: &Path) -> io::Result<FileStamp> {
        Err(io::ErrorKind::NotFound.into())
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn copy(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        std::thread::sleep(self.copy_delay);
        Ok(())
    }

    fn enumerate(&self, root: &Path, filter: &str) -> io::Result<Vec<PathBuf>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        let extension = filter.trim_start_matches('*');
        Ok((0..self.files_per_filter)
            .map(|i| root.join(format!("{i}{extension}")))
            .collect())
    }
}

/// Empty tree that records every `(root, filter)` enumeration in call order.
#[derive(Default)]
pub struct RecordingFs {
    enumerations: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingFs {
    pub fn enumerations(&self) -> Vec<(PathBuf, String)> {
        self.enumerations.lock().unwrap().clone()
    }
}

impl FileSystem for RecordingFs {
    fn file_exists(&self, _path: &Path) -> bool {
        false
    }

    fn stamp(&self, _path: &Path) -> io::Result<FileStamp> {
        Err(io::ErrorKind::NotFound.into())
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn copy(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Ok(())
    }

    fn enumerate(&self, root: &Path, filter: &str) -> io::Result<Vec<PathBuf>> {
        self.enumerations
            .lock()
            .unwrap()
            .push((root.to_path_buf(), filter.to_string()));
        Ok(Vec::new())
    }
}

/// Settings store that keeps everything in memory and records saves.
#[derive(Default)]
pub struct MemoryStore {
    initial: SyncSettings,
    pub saved: Mutex<Vec<SyncSettings>>,
}

impl MemoryStore {
    pub fn with_rules(rules: Vec<SyncRule>) -> Self {
        Self {
            initial: SyncSettings {
                rules,
                ..Default::default()
            },
            saved: Mutex::default(),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> SyncSettings {
        let mut settings = self.initial.clone();
        settings.normalize();
        settings
    }

    fn save(&self, settings: &SyncSettings) -> Result<()> {
        self.saved.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .with_settle_delay(Duration::from_millis(20))
        .with_retry(RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        })
}

pub struct Harness {
    pub engine: SyncEngine,
    pub rx: UnboundedReceiver<SyncNotification>,
    pub watches: Arc<ManualWatchSource>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    /// Engine over `fs` with every rule in `rules` switched on.
    pub async fn new(rules: Vec<SyncRule>, fs: Arc<dyn FileSystem>) -> Self {
        Self::with_config(rules, fs, fast_config()).await
    }

    pub async fn with_config(
        rules: Vec<SyncRule>,
        fs: Arc<dyn FileSystem>,
        config: EngineConfig,
    ) -> Self {
        let (notifier, rx) = Notifier::channel();
        let watches = Arc::new(ManualWatchSource::default());
        let store = Arc::new(MemoryStore::with_rules(rules));
        let engine =
            SyncEngine::with_backends(store.clone(), notifier, fs, watches.clone(), config);

        for rule in &mut engine.settings().write().await.rules {
            rule.enabled = true;
        }

        Self {
            engine,
            rx,
            watches,
            store,
        }
    }

    /// Notifications up to and including the next `StopSync`.
    pub async fn next_batch(&mut self) -> Vec<SyncNotification> {
        let mut seen = Vec::new();
        loop {
            let notification = tokio::time::timeout(Duration::from_secs(10), self.rx.recv())
                .await
                .expect("timed out waiting for StopSync")
                .expect("notification channel closed");
            let done = notification == SyncNotification::StopSync;
            seen.push(notification);
            if done {
                return seen;
            }
        }
    }

    /// Assert nothing is emitted for `wait`.
    pub async fn assert_quiet(&mut self, wait: Duration) {
        if let Ok(Some(notification)) = tokio::time::timeout(wait, self.rx.recv()).await {
            panic!("unexpected notification: {notification:?}");
        }
    }
}

/// Text of every log line in `notifications`.
pub fn log_lines(notifications: &[SyncNotification]) -> Vec<String> {
    notifications
        .iter()
        .filter_map(|n| match n {
            SyncNotification::Log(line) => Some(line.text.clone()),
            _ => None,
        })
        .collect()
}
