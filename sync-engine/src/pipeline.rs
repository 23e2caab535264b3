//! The per-file path shared by the sweep and watch events:
//! map destination, decide, copy.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{SyncRule, SyncSettings};
use crate::copy::{CopyExecutor, CopyOutcome};
use crate::decision::should_sync;
use crate::fs::FileSystem;
use crate::mapper::map_destination;
use crate::notification::Notifier;

/// Settings shared between the engine and the UI.
pub type SharedSettings = Arc<RwLock<SyncSettings>>;

/// Everything needed to evaluate and copy one file.
///
/// The blocking methods read the shared settings with `blocking_read`, so
/// they must run on a blocking thread.
#[derive(Clone)]
pub struct SyncPipeline {
    fs: Arc<dyn FileSystem>,
    settings: SharedSettings,
    executor: CopyExecutor,
    notifier: Notifier,
    settle_delay: Duration,
}

impl SyncPipeline {
    /// Create a pipeline.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        settings: SharedSettings,
        executor: CopyExecutor,
        notifier: Notifier,
        settle_delay: Duration,
    ) -> Self {
        Self {
            fs,
            settings,
            executor,
            notifier,
            settle_delay,
        }
    }

    /// File system used by the pipeline.
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Notification channel used by the pipeline.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Evaluate `source` against the live settings.
    pub fn needs_sync(&self, rule: &SyncRule, source: &Path, dest: &Path) -> bool {
        let settings = self.settings.blocking_read();
        should_sync(self.fs.as_ref(), &settings, rule, source, dest)
    }

    /// Copy one file if it changed. Returns the copy outcome, or `None` when
    /// no copy was needed.
    pub fn sync_file(&self, rule: &SyncRule, source: &Path) -> Option<CopyOutcome> {
        let dest = map_destination(source, rule);
        if !self.needs_sync(rule, source, &dest) {
            return None;
        }

        self.notifier.log(format!(
            "Copying {} to {}",
            source.display(),
            dest.display()
        ));
        Some(self.executor.copy(source, &dest))
    }

    /// Sweep every file under `rule.source` matching `filter`.
    ///
    /// Stops before the next file once `cancel` fires. Returns how many files
    /// were copied.
    pub fn sweep_filter(&self, rule: &SyncRule, filter: &str, cancel: &CancellationToken) -> usize {
        let files = match self.fs.enumerate(&rule.source, filter) {
            Ok(files) => files,
            Err(e) => {
                self.notifier.log(format!(
                    "Failed to list {} ({filter}): {e}",
                    rule.source.display()
                ));
                return 0;
            }
        };

        let mut copied = 0;
        for source in files {
            if cancel.is_cancelled() {
                debug!("Sweep of {} cancelled", rule.source.display());
                break;
            }

            if self
                .sync_file(rule, &source)
                .is_some_and(|outcome| outcome.is_copied())
            {
                copied += 1;
            }
        }
        copied
    }

    /// Handle a watch notification for `source` once the settle delay passes.
    ///
    /// Emits one `StartSync`/`StopSync` pair if, and only if, the file needs copying.
    pub async fn handle_change(self, rule: Arc<SyncRule>, source: PathBuf, cancel: CancellationToken) {
        let dest = map_destination(&source, &rule);

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.settle_delay) => {}
        }

        let result = tokio::task::spawn_blocking(move || {
            if cancel.is_cancelled() || !self.needs_sync(&rule, &source, &dest) {
                return;
            }

            let _batch = self.notifier.batch();
            self.notifier.log(format!(
                "Synchronizing {} to {}",
                source.display(),
                dest.display()
            ));
            self.executor.copy(&source, &dest);
        })
        .await;

        if let Err(e) = result {
            error!("Change handler failed: {e}");
        }
    }
}
