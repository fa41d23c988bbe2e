use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use ldapsync_core::SyncConfig;
use ldapsync_engine::{RunSummary, SyncRun};
use ldapsync_ldap::LdapDirectory;
use ldapsync_postgres::PostgresStore;

use crate::error::DaemonError;

/// When sync runs are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A single run, then exit.
    Once,
    /// A run at startup, then one per period until shutdown.
    Every(Duration),
}

impl Schedule {
    pub fn from_interval(interval: Option<Duration>) -> Self {
        match interval {
            Some(period) => Schedule::Every(period),
            None => Schedule::Once,
        }
    }
}

/// Command-line overrides applied on top of [`SyncConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Ignore `SYNC_INTERVAL` and run a single sync.
    pub once: bool,
    /// Compute changes without writing them to the database.
    pub dry_run: bool,
}

/// Start the sync runtime and block the current thread until it exits.
///
/// Returns the number of sync runs performed.
pub fn start_blocking(config: &SyncConfig, options: RunOptions) -> Result<usize, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;
    runtime.block_on(run(config, options))
}

/// Run the configured schedule against the LDAP directory and PostgreSQL store.
pub async fn run(config: &SyncConfig, options: RunOptions) -> Result<usize, DaemonError> {
    let store = PostgresStore::new(config.store.clone());
    let directory = LdapDirectory::new(config.directory.clone());
    let schedule = if options.once {
        Schedule::Once
    } else {
        Schedule::from_interval(config.interval)
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let signal_handle = match schedule {
        Schedule::Once => None,
        Schedule::Every(period) => {
            tracing::info!(interval = ?period, "scheduled sync enabled");
            Some(spawn_signal_listener(shutdown_tx.clone())?)
        }
    };

    let store = &store;
    let directory = &directory;
    let runs = drive(schedule, shutdown_rx, move || {
        SyncRun::new(store, directory)
            .dry_run(options.dry_run)
            .execute()
    })
    .await;

    if let Some(handle) = signal_handle {
        handle.abort();
    }
    tracing::debug!(runs, "sync runtime stopped");
    Ok(runs)
}

/// Perform one dry run and return its summary. Nothing is written.
pub fn preview_blocking(config: &SyncConfig) -> Result<RunSummary, DaemonError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;
    let store = PostgresStore::new(config.store.clone());
    let directory = LdapDirectory::new(config.directory.clone());
    Ok(runtime.block_on(SyncRun::new(&store, &directory).dry_run(true).execute()))
}

/// Sequential scheduler loop.
///
/// Runs `sync` once immediately. With [`Schedule::Every`], runs it again on
/// every tick until a message (or closure) arrives on `shutdown`. A run is
/// always awaited to completion; shutdown is only checked between runs and
/// wins over a pending tick. Ticks missed while a run is in flight are
/// skipped, so runs never overlap or catch up.
///
/// Returns the number of runs performed.
pub async fn drive<F, Fut>(
    schedule: Schedule,
    mut shutdown: broadcast::Receiver<()>,
    mut sync: F,
) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future,
{
    sync().await;
    let mut runs = 1;

    let Schedule::Every(period) = schedule else {
        return runs;
    };

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the first immediate tick

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("stopping scheduled sync");
                break;
            }
            _ = interval.tick() => {
                sync().await;
                runs += 1;
            }
        }
    }

    runs
}

fn spawn_signal_listener(
    shutdown: broadcast::Sender<()>,
) -> Result<JoinHandle<()>, DaemonError> {
    // Install handlers before the first run so a signal during it is queued.
    let mut signals = ShutdownSignals::install()?;
    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        tracing::info!(signal = name, "received shutdown signal");
        let _ = shutdown.send(());
    }))
}

#[cfg(unix)]
struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self, DaemonError> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(DaemonError::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(DaemonError::Signal)?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self, DaemonError> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}
