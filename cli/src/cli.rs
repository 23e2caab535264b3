//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filesync_engine::DEFAULT_SETTINGS_FILE;

/// FileSync - mirror build outputs into other folders as they change
#[derive(Parser, Debug)]
#[command(name = "filesync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file to read and update
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the configured rules and exclusion tokens
    List,

    /// Add a rule
    ///
    /// Examples:
    ///   filesync add --source bin/Debug --dest deploy --filters "*.exe;*.dll"
    ///   filesync add --source out --dest flat --flatten
    Add {
        /// Folder to mirror
        #[arg(long)]
        source: PathBuf,

        /// Folder receiving the copies
        #[arg(long)]
        dest: PathBuf,

        /// Inclusion patterns separated by `;` or `,`
        #[arg(long, default_value = "*")]
        filters: String,

        /// Put every file directly in the destination folder
        #[arg(long)]
        flatten: bool,
    },

    /// Remove the rule at INDEX (as shown by `list`)
    Remove { index: usize },

    /// Replace the exclusion tokens
    Exclude {
        /// Substrings excluding a file by name
        #[arg(long, num_args = 0..)]
        names: Option<Vec<String>>,

        /// Substrings excluding a file by full path
        #[arg(long, num_args = 0..)]
        paths: Option<Vec<String>>,
    },

    /// Synchronize until interrupted with Ctrl-C
    Run {
        /// Only enable the rules at these indexes
        #[arg(long = "rule")]
        rules: Vec<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_settings_default_to_working_directory() {
        let cli = Cli::try_parse_from(["filesync", "list"]).unwrap();

        assert_eq!(cli.settings, PathBuf::from(DEFAULT_SETTINGS_FILE));
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn test_add_parses_all_options() {
        let cli = Cli::try_parse_from([
            "filesync",
            "--settings",
            "custom.json",
            "add",
            "--source",
            "src",
            "--dest",
            "dst",
            "--filters",
            "*.exe;*.dll",
            "--flatten",
        ])
        .unwrap();

        assert_eq!(cli.settings, PathBuf::from("custom.json"));
        assert_eq!(
            cli.command,
            Command::Add {
                source: PathBuf::from("src"),
                dest: PathBuf::from("dst"),
                filters: "*.exe;*.dll".to_string(),
                flatten: true,
            }
        );
    }

    #[test]
    fn test_exclude_distinguishes_clear_from_untouched() {
        let cli = Cli::try_parse_from(["filesync", "exclude", "--names"]).unwrap();

        assert_eq!(
            cli.command,
            Command::Exclude {
                names: Some(Vec::new()),
                paths: None,
            }
        );
    }

    #[test]
    fn test_run_accepts_repeated_rules() {
        let cli = Cli::try_parse_from(["filesync", "run", "--rule", "0", "--rule", "2"]).unwrap();

        assert_eq!(cli.command, Command::Run { rules: vec![0, 2] });
    }
}
