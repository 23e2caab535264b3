//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Local;
use filesync_engine::{
    JsonSettingsStore, Notifier, SettingsStore, SyncEngine, SyncNotification, SyncRule,
    SyncSettings, parse_filters,
};
use tracing::info;

pub fn list(store: &JsonSettingsStore) {
    let settings = store.load();

    if settings.rules.is_empty() {
        println!("No rules in {}", store.path().display());
    }
    for (index, rule) in settings.rules.iter().enumerate() {
        println!("{}", describe_rule(index, rule));
    }

    println!(
        "Excluded names: {}",
        settings.excluded_file_name_tokens.join(", ")
    );
    println!(
        "Excluded paths: {}",
        settings.excluded_file_path_tokens.join(", ")
    );
}

pub fn add(
    store: &JsonSettingsStore,
    source: PathBuf,
    dest: PathBuf,
    filters: &str,
    flatten: bool,
) -> Result<()> {
    let rule = build_rule(source, dest, filters, flatten)?;

    let mut settings = store.load();
    settings.add_rule(rule);
    store.save(&settings)?;

    let index = settings.rules.len() - 1;
    println!("Added {}", describe_rule(index, &settings.rules[index]));
    Ok(())
}

/// A validated rule whose folders are stored as absolute paths.
fn build_rule(source: PathBuf, dest: PathBuf, filters: &str, flatten: bool) -> Result<SyncRule> {
    let mut rule = SyncRule::new(source, dest).with_filters(parse_filters(filters));
    rule.flatten = flatten;
    rule.validate()?;

    rule.source = std::fs::canonicalize(&rule.source)
        .with_context(|| format!("cannot resolve {}", rule.source.display()))?;
    rule.dest = std::fs::canonicalize(&rule.dest)
        .with_context(|| format!("cannot resolve {}", rule.dest.display()))?;
    Ok(rule)
}

pub fn remove(store: &JsonSettingsStore, index: usize) -> Result<()> {
    let mut settings = store.load();
    let Some(rule) = settings.remove_rule(index) else {
        bail!("no rule at index {index}");
    };
    store.save(&settings)?;

    println!(
        "Removed {} -> {}",
        rule.source.display(),
        rule.dest.display()
    );
    Ok(())
}

pub fn exclude(
    store: &JsonSettingsStore,
    names: Option<Vec<String>>,
    paths: Option<Vec<String>>,
) -> Result<()> {
    if names.is_none() && paths.is_none() {
        bail!("pass --names and/or --paths");
    }

    let mut settings = store.load();
    if let Some(names) = names {
        settings.set_excluded_file_name_tokens(names);
    }
    if let Some(paths) = paths {
        settings.set_excluded_file_path_tokens(paths);
    }
    store.save(&settings)?;
    Ok(())
}

pub async fn run(settings_path: &Path, selected: &[usize]) -> Result<()> {
    let (notifier, mut rx) = Notifier::channel();
    let engine = SyncEngine::new(
        Arc::new(JsonSettingsStore::new(settings_path)),
        notifier,
    );

    select_rules(&mut *engine.settings().write().await, selected)?;
    engine
        .enable(true)
        .await
        .with_context(|| format!("cannot start sync from {}", settings_path.display()))?;
    println!("FileSync running... press Ctrl+C to stop");

    let mut failed = false;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }
            notification = rx.recv() => match notification {
                Some(SyncNotification::InitialCopyFailed) => {
                    failed = true;
                    break;
                }
                Some(notification) => render(&notification),
                None => break,
            },
        }
    }

    engine.enable(false).await?;
    info!("Stopped");

    if failed {
        bail!("initial copy failed; sync was disabled");
    }
    Ok(())
}

/// Enable the rules at `selected`, or every rule when it is empty.
fn select_rules(settings: &mut SyncSettings, selected: &[usize]) -> Result<()> {
    if let Some(index) = selected.iter().find(|&&i| i >= settings.rules.len()) {
        bail!("no rule at index {index}");
    }

    for (index, rule) in settings.rules.iter_mut().enumerate() {
        rule.enabled = selected.is_empty() || selected.contains(&index);
    }
    Ok(())
}

fn render(notification: &SyncNotification) {
    match notification {
        SyncNotification::StartSync => println!("-- sync started"),
        SyncNotification::StopSync => println!("-- sync finished"),
        SyncNotification::Log(line) => {
            let time = line.timestamp.with_timezone(&Local).format("%H:%M:%S");
            println!("{time} {line}");
        }
        SyncNotification::InitialCopyFailed => println!("-- initial copy failed"),
    }
}

fn describe_rule(index: usize, rule: &SyncRule) -> String {
    format!(
        "[{index}] {} -> {} ({}){}",
        rule.source.display(),
        rule.dest.display(),
        rule.filters.join(";"),
        if rule.flatten { " flatten" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_rules() -> SyncSettings {
        SyncSettings {
            rules: vec![
                SyncRule::new("/a", "/x"),
                SyncRule::new("/b", "/y"),
                SyncRule::new("/c", "/z"),
            ],
            ..Default::default()
        }
    }

    fn enabled(settings: &SyncSettings) -> Vec<bool> {
        settings.rules.iter().map(|r| r.enabled).collect()
    }

    #[test]
    fn test_select_all_when_none_given() {
        let mut settings = three_rules();
        select_rules(&mut settings, &[]).unwrap();
        assert_eq!(enabled(&settings), vec![true, true, true]);
    }

    #[test]
    fn test_select_subset() {
        let mut settings = three_rules();
        select_rules(&mut settings, &[2, 0]).unwrap();
        assert_eq!(enabled(&settings), vec![true, false, true]);
    }

    #[test]
    fn test_select_out_of_range_fails() {
        let mut settings = three_rules();
        assert!(select_rules(&mut settings, &[3]).is_err());
        assert_eq!(enabled(&settings), vec![false, false, false]);
    }

    #[test]
    fn test_build_rule_stores_absolute_folders() {
        let src = tempfile::TempDir::new().unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();

        let rule = build_rule(
            src.path().join("sub").join(".."),
            dst.path().to_path_buf(),
            "*.exe;*.dll",
            true,
        )
        .unwrap();

        assert!(rule.source.is_absolute());
        assert_eq!(rule.source, std::fs::canonicalize(src.path()).unwrap());
        assert_eq!(rule.dest, std::fs::canonicalize(dst.path()).unwrap());
        assert_eq!(rule.filters, vec!["*.exe", "*.dll"]);
        assert!(rule.flatten);
    }

    #[test]
    fn test_build_rule_rejects_missing_folder() {
        let dst = tempfile::TempDir::new().unwrap();

        let result = build_rule(
            dst.path().join("missing"),
            dst.path().to_path_buf(),
            "*",
            false,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_describe_rule() {
        let rule = SyncRule::new("/src", "/dst")
            .with_filters(["*.exe", "*.dll"])
            .flattened();
        assert_eq!(
            describe_rule(1, &rule),
            "[1] /src -> /dst (*.exe;*.dll) flatten"
        );
    }
}
