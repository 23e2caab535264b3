//! FileSync command-line front end.
//!
//! # Usage
//!
//! ```bash
//! filesync add --source bin/Debug --dest deploy --filters "*.exe;*.dll"
//! filesync exclude --names vshost --paths /obj/
//! filesync run
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: tracing verbosity on stderr (default: `warn`). Sync progress
//!   is always printed to stdout.

mod cli;
mod commands;

use clap::Parser;
use filesync_engine::JsonSettingsStore;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = JsonSettingsStore::new(&cli.settings);

    match cli.command {
        Command::List => {
            commands::list(&store);
            Ok(())
        }
        Command::Add {
            source,
            dest,
            filters,
            flatten,
        } => commands::add(&store, source, dest, &filters, flatten),
        Command::Remove { index } => commands::remove(&store, index),
        Command::Exclude { names, paths } => commands::exclude(&store, names, paths),
        Command::Run { rules } => commands::run(&cli.settings, &rules).await,
    }
}
