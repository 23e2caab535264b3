//! # FileSync engine
//!
//! Mirrors source directory trees into destination directories according to
//! user-defined rules, and keeps the destinations up to date as sources change.
//!
//! ## Features
//!
//! - **Initial Sweep**: every enabled rule is copied once when sync is enabled
//! - **Real-time Watching**: one watch per rule filter afterwards
//! - **Flatten or Mirror**: destination layout chosen per rule
//! - **Exclusion Tokens**: global name/path substrings that are never copied
//! - **Retrying Copies**: locked files are retried with a fixed delay
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           SyncEngine                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  SettingsStore ──► SyncSettings ──► Sweep ──► WatchManager       │
//! │                                       │            │             │
//! │                                       ▼            ▼             │
//! │                 map_destination ► should_sync ► CopyExecutor     │
//! │                                                    │             │
//! │                                                    ▼             │
//! │                                       Notifier (StartSync/Log/…) │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod copy;
pub mod decision;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod fs;
pub mod mapper;
pub mod notification;
pub mod pipeline;
pub mod settings;
pub mod watcher;

pub use config::{EngineConfig, MATCH_ALL_FILTER, RetryPolicy, SyncRule, SyncSettings, parse_filters};
pub use copy::{CopyExecutor, CopyOutcome};
pub use decision::should_sync;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use event::{FileEvent, FileEventKind, WatchId};
pub use filter::{is_excluded, matches_inclusion_filters};
pub use fs::{FileStamp, FileSystem, LocalFileSystem};
pub use mapper::map_destination;
pub use notification::{LogLine, Notifier, SyncNotification};
pub use pipeline::{SharedSettings, SyncPipeline};
pub use settings::{DEFAULT_SETTINGS_FILE, JsonSettingsStore, SettingsStore};
pub use watcher::{NotifyWatchSource, WatchGuard, WatchManager, WatchSink, WatchSource};
