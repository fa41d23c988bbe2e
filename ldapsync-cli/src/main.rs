//! ldapsync: copy user attributes from an LDAP directory into a SQL user table.
//!
//! # Usage
//!
//! ```text
//! ldapsync [run [--once] [--dry-run]]
//! ldapsync diff [--json]
//! ```
//!
//! All connection settings come from `SYNC_*` environment variables or the
//! matching flags before the subcommand (`ldapsync --sql-table accounts run`).

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, run::RunArgs};
use ldapsync_core::ConfigArgs;

#[derive(Parser)]
#[command(
    name = "ldapsync",
    version,
    about = "Synchronize user attributes from LDAP into a relational database",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync once, or on the `SYNC_INTERVAL` schedule (default).
    Run(RunArgs),

    /// Show the attribute changes the next sync would write.
    Diff(DiffArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli
        .config
        .into_config()
        .context("invalid startup configuration")?;
    ldapsync_daemon::init_tracing(&config);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => args.run(&config),
        Commands::Diff(args) => args.run(&config),
    }
}
