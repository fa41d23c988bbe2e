//! Startup configuration read from `SYNC_*` environment variables.
//!
//! Every setting is declared on [`ConfigArgs`], so it can also be given as a
//! command-line flag. Configuration is loaded once, before any sync run. Every
//! problem is fatal and the process must not start syncing when one occurs.

use std::fmt;
use std::time::Duration;

use clap::builder::{FalseyValueParser, NonEmptyStringValueParser};
use clap::{Args, ValueEnum};

use crate::error::ConfigError;

pub const ENV_INTERVAL: &str = "SYNC_INTERVAL";
pub const ENV_CONNECT_TIMEOUT: &str = "SYNC_CONNECT_TIMEOUT";
pub const ENV_ATTRIBUTES: &str = "SYNC_ATTRIBUTES";
pub const ENV_LDAP_URL: &str = "SYNC_LDAP_URL";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Output format of the process-wide log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Fully validated process configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Verbose logging, including attribute values.
    pub debug: bool,
    pub log_format: LogFormat,
    /// `None` runs a single sync and exits.
    pub interval: Option<Duration>,
    pub directory: DirectoryConfig,
    pub store: StoreConfig,
}

/// Settings for the LDAP attribute source.
#[derive(Clone)]
pub struct DirectoryConfig {
    pub url: String,
    pub base_dn: String,
    /// Anonymous session when unset.
    pub bind_dn: Option<String>,
    pub bind_password: Option<String>,
    pub user_filter: String,
    pub id_attribute: String,
    pub attributes: Vec<String>,
    pub starttls: bool,
    pub connect_timeout: Duration,
}

/// Settings for the PostgreSQL record store.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub table: String,
    pub key_column: String,
    /// Attribute columns; their names equal the directory attribute names.
    pub columns: Vec<String>,
    pub connect_timeout: Duration,
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "<redacted>"))
            .field("user_filter", &self.user_filter)
            .field("id_attribute", &self.id_attribute)
            .field("attributes", &self.attributes)
            .field("starttls", &self.starttls)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The URL usually embeds the database password.
        f.debug_struct("StoreConfig")
            .field("url", &"<redacted>")
            .field("table", &self.table)
            .field("key_column", &self.key_column)
            .field("columns", &self.columns)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Raw settings as parsed by clap, from flags or their `SYNC_*` variables.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Verbose logging, including attribute values.
    #[arg(long, env = "SYNC_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Sync period such as `90s` or `1h30m`; a single sync when unset.
    #[arg(long, env = "SYNC_INTERVAL", value_parser = parse_interval)]
    pub interval: Option<Duration>,

    #[arg(long, env = "SYNC_LOG_FORMAT", value_enum, ignore_case = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Upper bound on opening each connection.
    #[arg(
        long,
        env = "SYNC_CONNECT_TIMEOUT",
        default_value = "10s",
        value_parser = parse_connect_timeout
    )]
    pub connect_timeout: Duration,

    /// Directory attributes to sync; also the SQL column names.
    #[arg(
        long,
        env = "SYNC_ATTRIBUTES",
        value_delimiter = ',',
        default_value = "cn,mail",
        value_parser = parse_attribute
    )]
    pub attributes: Vec<String>,

    #[arg(
        long,
        env = "SYNC_DATABASE_URL",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub database_url: String,

    #[arg(long, env = "SYNC_SQL_TABLE", default_value = "users", value_parser = parse_identifier)]
    pub sql_table: String,

    /// Column holding the user identifier.
    #[arg(
        long,
        env = "SYNC_SQL_KEY_COLUMN",
        default_value = "uid",
        value_parser = parse_identifier
    )]
    pub sql_key_column: String,

    #[arg(long, env = "SYNC_LDAP_URL", value_parser = parse_ldap_url)]
    pub ldap_url: String,

    #[arg(long, env = "SYNC_LDAP_BASE_DN", value_parser = NonEmptyStringValueParser::new())]
    pub ldap_base_dn: String,

    /// Bind DN; the session is anonymous when unset.
    #[arg(long, env = "SYNC_LDAP_BIND_DN", value_parser = NonEmptyStringValueParser::new())]
    pub ldap_bind_dn: Option<String>,

    #[arg(long, env = "SYNC_LDAP_BIND_PASSWORD", hide_env_values = true)]
    pub ldap_bind_password: Option<String>,

    /// Filter ANDed with the per-user identifier match.
    #[arg(long, env = "SYNC_LDAP_USER_FILTER", default_value = "(objectClass=*)")]
    pub ldap_user_filter: String,

    /// Directory attribute holding the user identifier.
    #[arg(long, env = "SYNC_LDAP_ID_ATTRIBUTE", default_value = "uid")]
    pub ldap_id_attribute: String,

    #[arg(long, env = "SYNC_LDAP_STARTTLS", value_parser = FalseyValueParser::new())]
    pub ldap_starttls: bool,
}

impl ConfigArgs {
    /// Validate settings that span more than one value.
    pub fn into_config(self) -> Result<SyncConfig, ConfigError> {
        let mut attributes: Vec<String> = Vec::new();
        for name in self.attributes {
            if !name.is_empty() && !attributes.contains(&name) {
                attributes.push(name);
            }
        }
        if attributes.is_empty() {
            return Err(ConfigError::Invalid {
                key: ENV_ATTRIBUTES,
                message: "at least one attribute name is required".into(),
            });
        }

        Ok(SyncConfig {
            debug: self.debug,
            log_format: self.log_format,
            interval: self.interval,
            store: StoreConfig {
                url: self.database_url,
                table: self.sql_table,
                key_column: self.sql_key_column,
                columns: attributes.clone(),
                connect_timeout: self.connect_timeout,
            },
            directory: DirectoryConfig {
                url: self.ldap_url,
                base_dn: self.ldap_base_dn,
                bind_dn: self.ldap_bind_dn,
                bind_password: self.ldap_bind_password,
                user_filter: self.ldap_user_filter,
                id_attribute: self.ldap_id_attribute,
                attributes,
                starttls: self.ldap_starttls,
                connect_timeout: self.connect_timeout,
            },
        })
    }
}

/// Parse a `SYNC_INTERVAL` value such as `90s`, `15m` or `1h30m`.
///
/// Negative and zero durations are rejected separately from unparsable text.
/// A leading `+` is accepted.
pub fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim();
    let malformed = |source| ConfigError::MalformedInterval {
        key: ENV_INTERVAL,
        value: value.to_string(),
        source,
    };
    let non_positive = || ConfigError::NonPositiveInterval {
        key: ENV_INTERVAL,
        value: value.to_string(),
    };

    if let Some(magnitude) = trimmed.strip_prefix('-') {
        return match humantime::parse_duration(magnitude.trim_start()) {
            Ok(_) => Err(non_positive()),
            Err(source) => Err(malformed(source)),
        };
    }

    let unsigned = trimmed.strip_prefix('+').map_or(trimmed, str::trim_start);
    let interval = humantime::parse_duration(unsigned).map_err(malformed)?;
    if interval.is_zero() {
        return Err(non_positive());
    }
    Ok(interval)
}

/// Whether `name` can be spliced into SQL as a quoted identifier.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_identifier(value: &str) -> Result<String, ConfigError> {
    if is_sql_identifier(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidIdentifier {
            value: value.to_string(),
        })
    }
}

/// One `SYNC_ATTRIBUTES` item. Blank items are kept empty and dropped by
/// [`ConfigArgs::into_config`].
fn parse_attribute(value: &str) -> Result<String, ConfigError> {
    match value.trim() {
        "" => Ok(String::new()),
        name => parse_identifier(name),
    }
}

fn parse_connect_timeout(value: &str) -> Result<Duration, ConfigError> {
    let timeout = humantime::parse_duration(value.trim()).map_err(|err| ConfigError::Invalid {
        key: ENV_CONNECT_TIMEOUT,
        message: err.to_string(),
    })?;
    if timeout.is_zero() {
        return Err(ConfigError::Invalid {
            key: ENV_CONNECT_TIMEOUT,
            message: "timeout must be greater than zero".into(),
        });
    }
    Ok(timeout)
}

fn parse_ldap_url(value: &str) -> Result<String, ConfigError> {
    let url = value.trim();
    if url.starts_with("ldap://") || url.starts_with("ldaps://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::Invalid {
            key: ENV_LDAP_URL,
            message: format!("expected an ldap:// or ldaps:// URL, got '{url}'"),
        })
    }
}
