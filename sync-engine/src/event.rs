//! File events raised by watches.

use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Identifier issued when a watch is created; routes its events to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(Uuid);

impl WatchId {
    /// Issue a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

/// A file system event tagged with the watch that raised it.
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// The watch that saw the change.
    pub watch_id: WatchId,

    /// The kind of event.
    pub kind: FileEventKind,

    /// Path to the affected file.
    pub path: PathBuf,

    /// When the event was received.
    pub timestamp: DateTime<Utc>,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(watch_id: WatchId, kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            watch_id,
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }

    /// Time since the event was received.
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.timestamp
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File content changed.
    Modified,

    /// File was renamed; the path is the new name.
    Renamed,

    /// File was deleted.
    Deleted,

    /// Anything else (access, metadata, unknown).
    Other,
}

impl FileEventKind {
    /// Whether this kind can require a copy.
    pub fn triggers_sync(self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Renamed)
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                notify::event::ModifyKind::Name(_) => Self::Renamed,
                notify::event::ModifyKind::Metadata(_) => Self::Other,
                _ => Self::Modified,
            },
            notify::EventKind::Remove(_) => Self::Deleted,
            _ => Self::Other,
        }
    }
}
