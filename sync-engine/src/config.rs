//! Configuration types: sync rules, shared settings, and engine timing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SyncError};

/// Filter used when a rule has none: every file name matches.
pub const MATCH_ALL_FILTER: &str = "*";

/// One source to destination mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SyncRule {
    /// Directory whose files are mirrored.
    pub source: PathBuf,

    /// Directory receiving the copies; created on demand.
    pub dest: PathBuf,

    /// Inclusion globs matched against file names, in sweep/watch order.
    #[serde(deserialize_with = "null_as_default")]
    pub filters: Vec<String>,

    /// Place every file directly under `dest` instead of mirroring sub-directories.
    pub flatten: bool,

    /// Whether the rule takes part in the next enable cycle. Never honoured on load.
    pub enabled: bool,
}

impl SyncRule {
    /// Create a rule matching every file, hierarchical and disabled.
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            filters: Vec::new(),
            flatten: false,
            enabled: false,
        }
    }

    /// Add an inclusion filter.
    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.filters.push(pattern.into());
        self
    }

    /// Replace the inclusion filters.
    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Flatten the destination layout.
    pub fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }

    /// Mark the rule enabled.
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Ensure at least one inclusion filter is present.
    pub fn normalize(&mut self) {
        if self.filters.is_empty() {
            self.filters.push(MATCH_ALL_FILTER.to_string());
        }
    }

    /// Check that both directories exist and that no filter is blank.
    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() || !self.source.is_dir() {
            return Err(SyncError::Config(format!(
                "source folder does not exist: {}",
                self.source.display()
            )));
        }

        if self.dest.as_os_str().is_empty() || !self.dest.is_dir() {
            return Err(SyncError::Config(format!(
                "destination folder does not exist: {}",
                self.dest.display()
            )));
        }

        if self.filters.iter().any(|f| f.trim().is_empty()) {
            return Err(SyncError::Config("filters must not be blank".to_string()));
        }

        Ok(())
    }
}

/// Split a user-entered filter list on `,` or `;`, dropping blank entries.
pub fn parse_filters(input: &str) -> Vec<String> {
    input
        .split([',', ';'])
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}

/// Rules plus global exclusion tokens.
///
/// Shared between the engine and the UI; the engine reads it whenever a file
/// is evaluated, so edits apply from the next evaluated file onwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SyncSettings {
    /// Rules in declared order.
    #[serde(deserialize_with = "null_as_default")]
    pub rules: Vec<SyncRule>,

    /// Substrings excluding a file when found in its lower-cased name.
    #[serde(deserialize_with = "null_as_default")]
    pub excluded_file_name_tokens: Vec<String>,

    /// Substrings excluding a file when found in its lower-cased full path.
    #[serde(deserialize_with = "null_as_default")]
    pub excluded_file_path_tokens: Vec<String>,
}

impl SyncSettings {
    /// Reset every rule to disabled and give empty filter lists a match-all filter.
    pub fn normalize(&mut self) {
        for rule in &mut self.rules {
            rule.enabled = false;
            rule.normalize();
        }
    }

    /// Append a rule, normalizing its filters.
    pub fn add_rule(&mut self, mut rule: SyncRule) {
        rule.normalize();
        self.rules.push(rule);
    }

    /// Remove the rule at `index`, if any.
    pub fn remove_rule(&mut self, index: usize) -> Option<SyncRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    /// Rules that take part in the next enable cycle, in declared order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &SyncRule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    /// Replace the file name exclusion tokens.
    pub fn set_excluded_file_name_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_file_name_tokens = clean_tokens(tokens);
    }

    /// Replace the file path exclusion tokens.
    pub fn set_excluded_file_path_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_file_path_tokens = clean_tokens(tokens);
    }
}

/// Older settings files store absent lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn clean_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Fixed-delay retry policy for file copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total copy attempts before giving up.
    pub max_attempts: u32,

    /// Wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}

/// Timing knobs for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wait applied to each watch event before it is evaluated.
    pub settle_delay: Duration,

    /// Copy retry policy.
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Set the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}
