//! The reconciliation engine: initial sweep, then watch-driven updates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{EngineConfig, SyncRule};
use crate::copy::CopyExecutor;
use crate::error::{Result, SyncError};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::notification::Notifier;
use crate::pipeline::{SharedSettings, SyncPipeline};
use crate::settings::SettingsStore;
use crate::watcher::{NotifyWatchSource, WatchManager, WatchSource};

/// Mirrors source trees into destination trees according to the loaded rules.
///
/// `enable(true)` runs one background sweep over every enabled rule and then
/// installs watches; `enable(false)` cancels the sweep and removes the watches.
/// Progress is reported on the injected [`Notifier`].
pub struct SyncEngine {
    settings: SharedSettings,
    store: Arc<dyn SettingsStore>,
    pipeline: SyncPipeline,
    watches: Arc<WatchManager>,
    session: Mutex<Option<CancellationToken>>,
}

impl SyncEngine {
    /// Create an engine on the local disk using notify watches.
    pub fn new(store: Arc<dyn SettingsStore>, notifier: Notifier) -> Self {
        Self::with_backends(
            store,
            notifier,
            Arc::new(LocalFileSystem),
            Arc::new(NotifyWatchSource),
            EngineConfig::default(),
        )
    }

    /// Create an engine with explicit file system, watch source and timings.
    pub fn with_backends(
        store: Arc<dyn SettingsStore>,
        notifier: Notifier,
        fs: Arc<dyn FileSystem>,
        watch_source: Arc<dyn WatchSource>,
        config: EngineConfig,
    ) -> Self {
        let settings = Arc::new(RwLock::new(store.load()));
        let executor = CopyExecutor::new(fs.clone(), config.retry, notifier.clone());
        let pipeline = SyncPipeline::new(
            fs,
            settings.clone(),
            executor,
            notifier,
            config.settle_delay,
        );

        Self {
            settings,
            store,
            pipeline,
            watches: Arc::new(WatchManager::new(watch_source)),
            session: Mutex::new(None),
        }
    }

    /// The live settings. Edits apply from the next evaluated file; rule
    /// changes apply from the next enable.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Whether a sweep or watch session is active.
    pub fn is_enabled(&self) -> bool {
        self.lock_session()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Whether watches are currently installed.
    pub async fn is_watching(&self) -> bool {
        self.watches.is_running().await
    }

    /// Number of installed watches.
    pub async fn watch_count(&self) -> usize {
        self.watches.watch_count().await
    }

    /// Turn synchronization on or off.
    ///
    /// Enabling with no rules fails with [`SyncError::NoRules`] and starts
    /// nothing. Redundant calls are no-ops. Disabling returns once the
    /// watches are gone; an interrupted sweep may still be unwinding.
    pub async fn enable(&self, value: bool) -> Result<()> {
        if value {
            self.start().await
        } else {
            self.stop().await;
            Ok(())
        }
    }

    /// Persist the live settings through the settings store.
    pub async fn save(&self) -> Result<()> {
        let settings = self.settings.read().await;
        self.store.save(&settings)
    }

    async fn start(&self) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        let rules: Vec<SyncRule> = {
            let settings = self.settings.read().await;
            if settings.rules.is_empty() {
                return Err(SyncError::NoRules);
            }
            settings
                .enabled_rules()
                .cloned()
                .map(|mut rule| {
                    rule.normalize();
                    rule
                })
                .collect()
        };

        let cancel = CancellationToken::new();
        {
            let mut session = self.lock_session();
            if session.as_ref().is_some_and(|token| !token.is_cancelled()) {
                return Ok(());
            }
            *session = Some(cancel.clone());
        }

        info!("Sync enabled for {} rules", rules.len());
        let sweep = Sweep {
            rules,
            pipeline: self.pipeline.clone(),
            watches: self.watches.clone(),
            cancel,
            runtime: Handle::current(),
        };
        tokio::task::spawn_blocking(move || sweep.run());

        Ok(())
    }

    async fn stop(&self) {
        let Some(cancel) = self.lock_session().take() else {
            return;
        };

        cancel.cancel();
        self.watches.stop().await;
        info!("Sync disabled");
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(cancel) = self.lock_session().take() {
            cancel.cancel();
        }
    }
}

/// The background half of one enable cycle.
struct Sweep {
    rules: Vec<SyncRule>,
    pipeline: SyncPipeline,
    watches: Arc<WatchManager>,
    cancel: CancellationToken,
    runtime: Handle,
}

impl Sweep {
    fn run(self) {
        let _batch = self.pipeline.notifier().batch();

        if !self.copy_all() {
            return;
        }

        if self.cancel.is_cancelled() {
            debug!("Sync disabled during initial sweep, not installing watches");
            return;
        }

        self.watches
            .start(&self.rules, &self.pipeline, &self.cancel, &self.runtime);
    }

    /// Sweep every rule and filter in declared order. Returns `false` if a
    /// destination folder could not be created.
    fn copy_all(&self) -> bool {
        let notifier = self.pipeline.notifier();

        for rule in &self.rules {
            if self.cancel.is_cancelled() {
                return true;
            }

            if let Err(e) = self.pipeline.fs().create_dir_all(&rule.dest) {
                notifier.log(format!(
                    "Failed to create directory {}: {e}",
                    rule.dest.display()
                ));
                notifier.initial_copy_failed();
                self.cancel.cancel();
                return false;
            }

            for filter in &rule.filters {
                if self.cancel.is_cancelled() {
                    return true;
                }

                let copied = self.pipeline.sweep_filter(rule, filter, &self.cancel);
                debug!(
                    "Swept {} ({filter}): {copied} files copied",
                    rule.source.display()
                );
            }
        }

        true
    }
}
