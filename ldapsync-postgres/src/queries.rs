//! SQL text for the user table.
//!
//! Table and column names come from validated configuration
//! (`config::is_sql_identifier`) and are always double-quoted. Values are
//! always bound as parameters.

use ldapsync_core::StoreConfig;

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// `SELECT "<key>"::text, "<attr>"::text, ... FROM "<table>"`
///
/// The key is column 0; attribute `i` of `config.columns` is column `i + 1`.
pub(crate) fn select_users(config: &StoreConfig) -> String {
    let columns: Vec<String> = std::iter::once(&config.key_column)
        .chain(config.columns.iter())
        .map(|column| format!("{}::text", quote(column)))
        .collect();
    format!("SELECT {} FROM {}", columns.join(", "), quote(&config.table))
}

/// `UPDATE "<table>" SET "<a>" = $1, "<b>" = $2 WHERE "<key>" = $3`
///
/// Parameters are bound in `columns` order, followed by the user identifier.
pub(crate) fn update_user(config: &StoreConfig, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{} = ${}", quote(column), idx + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quote(&config.table),
        assignments.join(", "),
        quote(&config.key_column),
        columns.len() + 1
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config() -> StoreConfig {
        StoreConfig {
            url: "postgres://localhost/app".into(),
            table: "users".into(),
            key_column: "uid".into(),
            columns: vec!["mail".into(), "cn".into()],
            connect_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn select_reads_key_then_attributes_as_text() {
        assert_eq!(
            select_users(&config()),
            r#"SELECT "uid"::text, "mail"::text, "cn"::text FROM "users""#
        );
    }

    #[test]
    fn update_binds_values_before_key() {
        assert_eq!(
            update_user(&config(), &["mail", "cn"]),
            r#"UPDATE "users" SET "mail" = $1, "cn" = $2 WHERE "uid" = $3"#
        );
    }

    #[test]
    fn update_single_column() {
        assert_eq!(
            update_user(&config(), &["cn"]),
            r#"UPDATE "users" SET "cn" = $1 WHERE "uid" = $2"#
        );
    }
}
