//! `ldapsync diff`: preview pending attribute changes without writing them.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ldapsync_core::{ChangeRecord, SyncConfig, UserId};
use ldapsync_engine::RunSummary;

/// Arguments for `ldapsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let summary =
            ldapsync_daemon::preview_blocking(config).context("failed to start sync runtime")?;

        if let Some(err) = &summary.error {
            bail!("diff failed: {err}");
        }

        if self.json {
            print_json(&summary)?;
        } else {
            print_table(&summary);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DiffReportJson<'a> {
    started_at: DateTime<Utc>,
    scanned: usize,
    changed: usize,
    failed_lookups: &'a [UserId],
    changes: &'a [ChangeRecord],
}

#[derive(Tabled)]
struct ChangeTableRow {
    #[tabled(rename = "user")]
    user: String,
    #[tabled(rename = "attribute")]
    attribute: String,
    #[tabled(rename = "database")]
    old: String,
    #[tabled(rename = "directory")]
    new: String,
}

fn print_json(summary: &RunSummary) -> Result<()> {
    let payload = DiffReportJson {
        started_at: summary.started_at,
        scanned: summary.users_scanned,
        changed: summary.users_changed,
        failed_lookups: &summary.failed_lookups,
        changes: &summary.change_set,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize diff JSON")?
    );
    Ok(())
}

fn print_table(summary: &RunSummary) {
    println!(
        "ldapsync v{} | {} users scanned | {} changed | {} lookups failed",
        env!("CARGO_PKG_VERSION"),
        summary.users_scanned,
        summary.users_changed,
        summary.failed_lookups.len(),
    );

    if summary.change_set.is_empty() {
        println!("{}", "No differences.".green());
    } else {
        let mut table = Table::new(table_rows(&summary.change_set));
        table.with(Style::rounded());
        println!("{table}");
    }

    if !summary.failed_lookups.is_empty() {
        let users: Vec<&str> = summary.failed_lookups.iter().map(UserId::as_str).collect();
        println!(
            "{} {}",
            "Lookup failed for:".yellow().bold(),
            users.join(", ")
        );
    }
}

fn table_rows(change_set: &[ChangeRecord]) -> Vec<ChangeTableRow> {
    change_set
        .iter()
        .flat_map(|record| {
            record.changes.iter().map(|change| ChangeTableRow {
                user: record.user.to_string(),
                attribute: change.attribute.clone(),
                old: change
                    .old
                    .clone()
                    .unwrap_or_else(|| "(missing)".to_string()),
                new: change.new.clone(),
            })
        })
        .collect()
}
