//! File system access used by the sync pipeline.
//!
//! Everything the engine does to disk goes through [`FileSystem`] so the
//! sweep and the change decision can be exercised against in-memory fakes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::filter::matches_filter;

/// The size and timestamp pair used to decide whether two files are in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    /// Length in bytes.
    pub len: u64,

    /// Last write time, when the platform reports one.
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Build a stamp from file metadata.
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Disk operations needed by the engine.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists and is a regular file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Size and timestamp of `path`. A missing file yields `ErrorKind::NotFound`.
    fn stamp(&self, path: &Path) -> io::Result<FileStamp>;

    /// Create `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` over `to`, carrying the source's last write time across.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Every file under `root`, recursively, whose name matches `filter`.
    fn enumerate(&self, root: &Path, filter: &str) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn stamp(&self, path: &Path) -> io::Result<FileStamp> {
        fs::metadata(path).map(|m| FileStamp::from_metadata(&m))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let modified = fs::metadata(from)?.modified()?;
        fs::copy(from, to)?;

        // CopyFileEx already preserves the write time on Windows. The copy may
        // carry a read-only mode, so the time is set through a read handle.
        #[cfg(not(windows))]
        fs::File::open(to)?.set_modified(modified)?;
        #[cfg(windows)]
        let _ = modified;

        Ok(())
    }

    fn enumerate(&self, root: &Path, filter: &str) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source folder not found: {}", root.display()),
            ));
        }

        let files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", root.display());
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| matches_filter(&e.file_name().to_string_lossy(), filter))
            .map(walkdir::DirEntry::into_path)
            .collect();

        debug!(
            "Enumerated {} files matching {filter} under {}",
            files.len(),
            root.display()
        );
        Ok(files)
    }
}
