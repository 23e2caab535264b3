//! Exclusion tokens and inclusion globs.

use std::path::Path;

use wildmatch::WildMatch;

use crate::config::{MATCH_ALL_FILTER, SyncSettings};

/// Legacy match-all filter written by older settings files.
const LEGACY_MATCH_ALL_FILTER: &str = "*.*";

/// Check whether a path is excluded by the global exclusion tokens.
///
/// The lower-cased file name is tested against the name tokens and the
/// lower-cased full path against the path tokens. Any substring hit excludes.
pub fn is_excluded(path: &Path, settings: &SyncSettings) -> bool {
    let lower_path = path.to_string_lossy().to_lowercase();
    let lower_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    contains_any(&lower_name, &settings.excluded_file_name_tokens)
        || contains_any(&lower_path, &settings.excluded_file_path_tokens)
}

fn contains_any(haystack: &str, tokens: &[String]) -> bool {
    tokens
        .iter()
        .filter(|t| !t.is_empty())
        .any(|t| haystack.contains(&t.to_lowercase()))
}

/// Check whether a file name matches at least one inclusion glob.
pub fn matches_inclusion_filters<S: AsRef<str>>(file_name: &str, filters: &[S]) -> bool {
    filters.iter().any(|f| matches_filter(file_name, f.as_ref()))
}

/// Anchored, case-insensitive glob match supporting `*` and `?`.
pub fn matches_filter(file_name: &str, filter: &str) -> bool {
    let filter = filter.trim();
    if filter == MATCH_ALL_FILTER || filter == LEGACY_MATCH_ALL_FILTER {
        return true;
    }

    WildMatch::new(&filter.to_lowercase()).matches(&file_name.to_lowercase())
}
