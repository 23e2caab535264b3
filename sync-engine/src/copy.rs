//! Single-file copy with bounded retry.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::config::RetryPolicy;
use crate::fs::FileSystem;
use crate::notification::Notifier;

/// Result of a copy request. Failures are already reported as log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The file was copied.
    Copied { attempts: u32 },

    /// Every attempt failed; `error` is the last failure.
    Failed { attempts: u32, error: String },
}

impl CopyOutcome {
    /// Whether the copy went through.
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }
}

/// Copies files, retrying transient failures (locked files, permissions)
/// with a fixed delay.
///
/// [`CopyExecutor::copy`] sleeps between attempts, so call it from a blocking
/// thread.
#[derive(Clone)]
pub struct CopyExecutor {
    fs: Arc<dyn FileSystem>,
    retry: RetryPolicy,
    notifier: Notifier,
}

impl CopyExecutor {
    /// Create a new copy executor.
    pub fn new(fs: Arc<dyn FileSystem>, retry: RetryPolicy, notifier: Notifier) -> Self {
        Self {
            fs,
            retry,
            notifier,
        }
    }

    /// Copy `source` over `dest`, creating `dest`'s parent folder as needed.
    pub fn copy(&self, source: &Path, dest: &Path) -> CopyOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.try_copy(source, dest) {
                Ok(()) => {
                    debug!(
                        "Copied {} to {} (attempt {attempts})",
                        source.display(),
                        dest.display()
                    );
                    return CopyOutcome::Copied { attempts };
                }
                Err(e) if attempts >= max_attempts => {
                    self.notifier.log(format!(
                        "Failed to copy {} to {}: {e}",
                        source.display(),
                        dest.display()
                    ));
                    return CopyOutcome::Failed {
                        attempts,
                        error: e.to_string(),
                    };
                }
                Err(e) => {
                    debug!(
                        "Copy attempt {attempts} of {} failed: {e}",
                        source.display()
                    );
                    thread::sleep(self.retry.delay);
                }
            }
        }
    }

    fn try_copy(&self, source: &Path, dest: &Path) -> io::Result<()> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.copy(source, dest)
    }
}
