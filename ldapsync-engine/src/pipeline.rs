//! One complete sync pass: load stored users, look each one up in the
//! directory, diff, and persist the changed users in a single batch.
//!
//! Shared by the `ldapsync run` scheduler and `ldapsync diff`.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use ldapsync_core::{
    AttributeSource, ChangeRecord, ChangeSet, DirectorySession, RecordStore, StoreSession,
    StoredUserSet, UserId,
};

use crate::{diff, SyncError};

/// Outcome of a single sync run.
#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Stored users that were looked up in the directory.
    pub users_scanned: usize,
    pub users_changed: usize,
    /// Users skipped because their directory lookup failed.
    pub failed_lookups: Vec<UserId>,
    /// Change records whose update matched a stored row; zero when the batch
    /// was skipped.
    pub updates_applied: usize,
    pub dry_run: bool,
    pub change_set: ChangeSet,
    /// Set when the run ended early or the batch update failed.
    pub error: Option<SyncError>,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            users_scanned: 0,
            users_changed: 0,
            failed_lookups: Vec::new(),
            updates_applied: 0,
            dry_run,
            change_set: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A single sync pass over borrowed connectors.
///
/// Each execution opens its own sessions and closes them before returning.
#[derive(Debug)]
pub struct SyncRun<'a, S, D> {
    store: &'a S,
    directory: &'a D,
    dry_run: bool,
}

impl<'a, S, D> SyncRun<'a, S, D>
where
    S: RecordStore,
    D: AttributeSource,
{
    pub fn new(store: &'a S, directory: &'a D) -> Self {
        Self {
            store,
            directory,
            dry_run: false,
        }
    }

    /// Compute the change set but never call the store's batch update.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute the run. Failures are logged and recorded in the summary, never
    /// returned.
    pub async fn execute(self) -> RunSummary {
        info!(dry_run = self.dry_run, "starting LDAP sync");

        let started = Instant::now();
        let mut summary = RunSummary::new(Utc::now(), self.dry_run);

        if let Err(err) = self.sync(&mut summary).await {
            error!(error = %err, "LDAP sync failed");
            summary.error = Some(err);
        }

        summary.duration = started.elapsed();
        info!(
            time = ?summary.duration,
            scanned = summary.users_scanned,
            changed = summary.users_changed,
            failed_lookups = summary.failed_lookups.len(),
            "finished LDAP sync",
        );
        summary
    }

    async fn sync(&self, summary: &mut RunSummary) -> Result<(), SyncError> {
        let mut store = self.store.open().await.map_err(SyncError::StoreOpen)?;
        let result = self.sync_with_store(&mut store, summary).await;
        store.close().await;
        result
    }

    async fn sync_with_store(
        &self,
        store: &mut S::Session,
        summary: &mut RunSummary,
    ) -> Result<(), SyncError> {
        let users = store.fetch_all().await.map_err(SyncError::StoreFetch)?;
        debug!(amount = users.len(), "fetched users from database");

        let mut directory = self
            .directory
            .open()
            .await
            .map_err(SyncError::DirectoryOpen)?;
        collect_changes(&mut directory, &users, summary).await;
        directory.close().await;

        summary.users_changed = summary.change_set.len();
        if summary.change_set.is_empty() {
            return Ok(());
        }

        if self.dry_run {
            info!(
                updates = summary.change_set.len(),
                "[dry-run] skipping database update"
            );
            return Ok(());
        }

        summary.updates_applied = store
            .apply_batch(&summary.change_set)
            .await
            .map_err(SyncError::BatchUpdate)?;
        info!(
            updates = summary.updates_applied,
            submitted = summary.change_set.len(),
            "updated database users"
        );
        Ok(())
    }
}

/// Look up every stored user and append the changed ones to the summary's
/// change set. A failed lookup skips that user only.
async fn collect_changes<T: DirectorySession>(
    directory: &mut T,
    users: &StoredUserSet,
    summary: &mut RunSummary,
) {
    for (user, stored) in users {
        summary.users_scanned += 1;

        let fetched = match directory.search(user).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(user = %user, error = %err, "failed to query LDAP user");
                summary.failed_lookups.push(user.clone());
                continue;
            }
        };

        debug!(
            user = %user,
            stored = ?stored,
            fetched = ?fetched,
            "fetched user data",
        );

        if !diff::is_changed(stored, &fetched) {
            continue;
        }

        let changes = diff::attribute_changes(stored, &fetched);
        for change in &changes {
            debug!(
                user = %user,
                attribute = %change.attribute,
                old = ?change.old,
                new = %change.new,
                "user attribute has changed",
            );
        }
        info!(user = %user, "user has changed");

        summary.change_set.push(ChangeRecord {
            user: user.clone(),
            attributes: fetched,
            changes,
        });
    }
}
