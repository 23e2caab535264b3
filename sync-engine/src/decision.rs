//! Whether a source file needs copying.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::config::{SyncRule, SyncSettings};
use crate::filter::{is_excluded, matches_inclusion_filters};
use crate::fs::FileSystem;

/// Decide whether `source` must be copied to `dest` under `rule`.
///
/// Identical length and last write time count as in sync; content is not
/// compared. A destination that vanishes before it can be inspected forces a
/// copy, a source that vanishes cancels it.
pub fn should_sync(
    fs: &dyn FileSystem,
    settings: &SyncSettings,
    rule: &SyncRule,
    source: &Path,
    dest: &Path,
) -> bool {
    if is_excluded(source, settings) {
        debug!("Excluded: {}", source.display());
        return false;
    }

    let file_name = source
        .file_name()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default();
    if !matches_inclusion_filters(&file_name, &rule.filters) {
        return false;
    }

    if !fs.file_exists(dest) {
        return true;
    }

    let dest_stamp = match fs.stamp(dest) {
        Ok(stamp) => stamp,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
        Err(e) => {
            debug!("Could not inspect {}: {e}", dest.display());
            return true;
        }
    };

    let source_stamp = match fs.stamp(source) {
        Ok(stamp) => stamp,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return false,
        Err(e) => {
            debug!("Could not inspect {}: {e}", source.display());
            return true;
        }
    };

    source_stamp != dest_stamp
}
