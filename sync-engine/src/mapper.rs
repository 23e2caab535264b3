//! Source to destination path mapping.

use std::path::{Path, PathBuf};

use crate::config::SyncRule;

/// Map a file under `rule.source` to its location under `rule.dest`.
///
/// Flattened rules keep only the file name. Otherwise the path relative to
/// `rule.source` is preserved. A path outside `rule.source` falls back to the
/// flattened layout.
pub fn map_destination(source_file: &Path, rule: &SyncRule) -> PathBuf {
    if rule.flatten {
        return flattened(source_file, &rule.dest);
    }

    match source_file.strip_prefix(&rule.source) {
        Ok(relative) => rule.dest.join(relative),
        Err(_) => flattened(source_file, &rule.dest),
    }
}

fn flattened(source_file: &Path, dest: &Path) -> PathBuf {
    match source_file.file_name() {
        Some(name) => dest.join(name),
        None => dest.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule(flatten: bool) -> SyncRule {
        let rule = SyncRule::new("/src", "/dst").filter("*.exe");
        if flatten { rule.flattened() } else { rule }
    }

    #[test]
    fn test_flatten_keeps_file_name_only() {
        let cases = ["/src/app.exe", "/src/a/app.exe", "/src/a/b/c/app.exe"];
        for case in cases {
            let dest = map_destination(Path::new(case), &rule(true));
            assert_eq!(dest, Path::new("/dst/app.exe"));
            assert_eq!(dest.parent(), Some(Path::new("/dst")));
        }
    }

    #[test]
    fn test_hierarchical_preserves_sub_path() {
        let dest = map_destination(Path::new("/src/a/b/app.exe"), &rule(false));
        assert_eq!(dest, Path::new("/dst/a/b/app.exe"));

        let dest = map_destination(Path::new("/src/app.exe"), &rule(false));
        assert_eq!(dest, Path::new("/dst/app.exe"));
    }

    #[test]
    fn test_hierarchical_outside_source_falls_back_to_file_name() {
        let dest = map_destination(Path::new("/elsewhere/x/app.exe"), &rule(false));
        assert_eq!(dest, Path::new("/dst/app.exe"));
    }
}
