//! Lifecycle signals and log lines sent to the UI.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A message from the engine to whoever renders its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotification {
    /// A sweep or an event-driven copy started.
    StartSync,

    /// The matching [`SyncNotification::StartSync`] finished.
    StopSync,

    /// Human-readable progress line.
    Log(LogLine),

    /// A destination folder could not be created; sync was forced back to disabled.
    InitialCopyFailed,
}

/// A timestamped free-text log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// When the line was produced.
    pub timestamp: DateTime<Utc>,

    /// The message.
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Sending half of the notification channel, injected into the engine.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<SyncNotification>,
}

impl Notifier {
    /// Create a notifier and the receiver the UI listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit `StartSync` now and `StopSync` when the returned guard drops.
    pub fn batch(&self) -> SyncBatch {
        self.send(SyncNotification::StartSync);
        SyncBatch {
            notifier: self.clone(),
        }
    }

    /// Send a log line, mirroring it to tracing.
    pub fn log(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{text}");
        self.send(SyncNotification::Log(LogLine {
            timestamp: Utc::now(),
            text,
        }));
    }

    /// Report that a destination directory could not be provisioned.
    pub fn initial_copy_failed(&self) {
        self.send(SyncNotification::InitialCopyFailed);
    }

    fn send(&self, notification: SyncNotification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

/// Guard pairing a `StartSync` with its `StopSync`.
#[must_use = "dropping the batch immediately emits StopSync"]
pub struct SyncBatch {
    notifier: Notifier,
}

impl Drop for SyncBatch {
    fn drop(&mut self) {
        self.notifier.send(SyncNotification::StopSync);
    }
}
