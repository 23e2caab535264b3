//! Rule-scoped file system watches.
//!
//! One watch per (rule, filter) pair. Every watch is tagged with a [`WatchId`]
//! when it is created; events carry that id and are routed back to the rule
//! through a map, so no watcher identity comparisons are needed.

use std::any::Any;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SyncRule;
use crate::error::Result;
use crate::event::{FileEvent, FileEventKind, WatchId};
use crate::filter::matches_filter;
use crate::pipeline::SyncPipeline;

/// Keeps a watch alive; dropping it unsubscribes.
pub type WatchGuard = Box<dyn Any + Send>;

/// Delivery end of a single watch.
#[derive(Debug, Clone)]
pub struct WatchSink {
    id: WatchId,
    tx: mpsc::UnboundedSender<FileEvent>,
}

impl WatchSink {
    /// Identifier of the watch this sink belongs to.
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Deliver an event. Returns `false` once the manager stopped listening.
    pub fn emit(&self, kind: FileEventKind, path: impl Into<PathBuf>) -> bool {
        self.tx.send(FileEvent::new(self.id, kind, path)).is_ok()
    }
}

/// Something that can watch a directory tree recursively.
pub trait WatchSource: Send + Sync {
    /// Watch `root` and everything below it, delivering to `sink` until the
    /// returned guard is dropped.
    fn watch(&self, root: &Path, sink: WatchSink) -> Result<WatchGuard>;
}

/// [`WatchSource`] backed by notify's recommended watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatchSource;

impl WatchSource for NotifyWatchSource {
    fn watch(&self, root: &Path, sink: WatchSink) -> Result<WatchGuard> {
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let kind = FileEventKind::from(event.kind);
                    if !kind.triggers_sync() {
                        return;
                    }

                    for path in event.paths {
                        if !sink.emit(kind, path) {
                            debug!("Watch {:?} closed, dropping event", sink.id());
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            },
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Box::new(watcher))
    }
}

/// What a watch feeds: the rule it belongs to and its filter.
#[derive(Debug)]
struct WatchRoute {
    rule: Arc<SyncRule>,
    filter: String,
}

impl WatchRoute {
    fn accepts(&self, path: &Path) -> bool {
        path.file_name()
            .map(OsStr::to_string_lossy)
            .is_some_and(|name| matches_filter(&name, &self.filter))
    }
}

/// Installed watches of one enable cycle.
struct WatchSession {
    guards: HashMap<WatchId, WatchGuard>,
    cancel: CancellationToken,
}

/// Owns the watches of the running engine.
///
/// `Stopped` → `Running` → `Stopped`. Installation and teardown share one
/// mutex so they never interleave.
pub struct WatchManager {
    source: Arc<dyn WatchSource>,
    session: Mutex<Option<WatchSession>>,
}

impl WatchManager {
    /// Create a stopped watch manager.
    pub fn new(source: Arc<dyn WatchSource>) -> Self {
        Self {
            source,
            session: Mutex::new(None),
        }
    }

    /// Install one watch per (rule, filter) pair and start routing events into
    /// `pipeline`. Blocking; call from a blocking thread.
    ///
    /// Does nothing when already running or when `cancel` has fired. Returns
    /// the number of watches installed.
    pub fn start(
        &self,
        rules: &[SyncRule],
        pipeline: &SyncPipeline,
        cancel: &CancellationToken,
        runtime: &Handle,
    ) -> usize {
        let mut session = self.session.blocking_lock();
        if session.is_some() || cancel.is_cancelled() {
            return 0;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut guards = HashMap::new();
        let mut routes = HashMap::new();

        for rule in rules {
            pipeline
                .notifier()
                .log(format!("Watching {}", rule.source.display()));
            let shared_rule = Arc::new(rule.clone());

            for filter in &rule.filters {
                let id = WatchId::new();
                let sink = WatchSink { id, tx: tx.clone() };

                match self.source.watch(&rule.source, sink) {
                    Ok(guard) => {
                        debug!("Watching {} for {filter}", rule.source.display());
                        guards.insert(id, guard);
                        routes.insert(
                            id,
                            Arc::new(WatchRoute {
                                rule: shared_rule.clone(),
                                filter: filter.clone(),
                            }),
                        );
                    }
                    Err(e) => {
                        warn!("Failed to watch {}: {e}", rule.source.display());
                        pipeline.notifier().log(format!(
                            "Failed to watch {} ({filter}): {e}",
                            rule.source.display()
                        ));
                    }
                }
            }
        }

        let installed = guards.len();
        let session_cancel = cancel.child_token();
        runtime.spawn(dispatch(
            rx,
            routes,
            pipeline.clone(),
            session_cancel.clone(),
        ));

        *session = Some(WatchSession {
            guards,
            cancel: session_cancel,
        });
        info!("Installed {installed} watches");
        installed
    }

    /// Unsubscribe and discard every watch.
    pub async fn stop(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.cancel.cancel();
            let count = session.guards.len();
            drop(session.guards);
            info!("Removed {count} watches");
        }
    }

    /// Check if watches are installed.
    pub async fn is_running(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Number of installed watches.
    pub async fn watch_count(&self) -> usize {
        self.session
            .lock()
            .await
            .as_ref()
            .map_or(0, |s| s.guards.len())
    }
}

/// Route events of one session until it is cancelled.
async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<FileEvent>,
    routes: HashMap<WatchId, Arc<WatchRoute>>,
    pipeline: SyncPipeline,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if !event.kind.triggers_sync() {
            continue;
        }

        let Some(route) = routes.get(&event.watch_id) else {
            debug!("Event from unknown watch {:?}", event.watch_id);
            continue;
        };

        if !route.accepts(&event.path) {
            continue;
        }

        // Deleted again before we got to it.
        if !pipeline.fs().file_exists(&event.path) {
            continue;
        }

        debug!(
            "{:?} {} (queued {} ms)",
            event.kind,
            event.path.display(),
            event.age().num_milliseconds()
        );
        tokio::spawn(pipeline.clone().handle_change(
            route.rule.clone(),
            event.path,
            cancel.clone(),
        ));
    }

    debug!("Watch dispatcher stopped");
}
