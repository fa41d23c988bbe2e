//! `ldapsync run`: the sync scheduler.

use anyhow::{Context, Result};
use clap::Args;

use ldapsync_core::SyncConfig;
use ldapsync_daemon::RunOptions;

/// Arguments for `ldapsync run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Perform a single sync even when SYNC_INTERVAL is set.
    #[arg(long)]
    pub once: bool,

    /// Compute changes without updating the database.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Sync failures are logged by the run itself and do not change the exit
    /// status; only runtime setup errors are returned.
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let options = RunOptions {
            once: self.once,
            dry_run: self.dry_run,
        };
        ldapsync_daemon::start_blocking(config, options).context("sync runtime failed")?;
        Ok(())
    }
}
