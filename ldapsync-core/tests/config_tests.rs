//! Startup configuration parsing through the clap argument definitions.
//!
//! Settings are passed as flags; each flag reads the same value parser as its
//! `SYNC_*` variable.

use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use ldapsync_core::{config::parse_interval, ConfigArgs, ConfigError, LogFormat, SyncConfig};
use rstest::rstest;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    config: ConfigArgs,
}

const BASE: [&str; 7] = [
    "ldapsync",
    "--database-url",
    "postgres://sync@localhost/app",
    "--ldap-url",
    "ldap://localhost:389",
    "--ldap-base-dn",
    "ou=people,dc=example,dc=org",
];

fn parse(extra: &[&str]) -> Result<ConfigArgs, clap::Error> {
    TestCli::try_parse_from(BASE.iter().chain(extra).copied()).map(|cli| cli.config)
}

/// The base arguments without `flag` and its value.
fn base_without(flag: &str) -> Vec<&'static str> {
    let position = BASE.iter().position(|arg| *arg == flag).expect("flag");
    BASE.iter()
        .enumerate()
        .filter(|(idx, _)| *idx != position && *idx != position + 1)
        .map(|(_, arg)| *arg)
        .collect()
}

fn load(extra: &[&str]) -> SyncConfig {
    parse(extra)
        .expect("arguments")
        .into_config()
        .expect("config")
}

/// Parse `extra` and expect a value parser to reject it.
fn rejected(extra: &[&str]) -> clap::Error {
    match parse(extra) {
        Ok(_) => panic!("expected {extra:?} to be rejected"),
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "got: {err}");
            err
        }
    }
}

fn config_error(err: &clap::Error) -> &ConfigError {
    std::error::Error::source(err)
        .and_then(|source| source.downcast_ref::<ConfigError>())
        .expect("ConfigError source")
}

// ---------------------------------------------------------------------------
// 1. Defaults
// ---------------------------------------------------------------------------

#[test]
fn minimal_settings_use_defaults() {
    let cfg = load(&[]);
    assert!(!cfg.debug);
    assert_eq!(cfg.interval, None, "no interval means single-shot mode");
    assert_eq!(cfg.log_format, LogFormat::Text);
    assert_eq!(cfg.store.table, "users");
    assert_eq!(cfg.store.key_column, "uid");
    assert_eq!(cfg.store.columns, ["cn", "mail"]);
    assert_eq!(cfg.directory.attributes, cfg.store.columns);
    assert_eq!(cfg.directory.user_filter, "(objectClass=*)");
    assert_eq!(cfg.directory.id_attribute, "uid");
    assert_eq!(cfg.directory.bind_dn, None);
    assert!(!cfg.directory.starttls);
    assert_eq!(cfg.directory.connect_timeout, Duration::from_secs(10));
}

#[test]
fn explicit_settings_override_defaults() {
    let cfg = load(&[
        "--debug",
        "--interval",
        "15m",
        "--log-format",
        "JSON",
        "--attributes",
        "givenName,sn,mail",
        "--sql-table",
        "accounts",
        "--sql-key-column",
        "login",
        "--ldap-bind-dn",
        "cn=sync,dc=example,dc=org",
        "--ldap-bind-password",
        "secret",
        "--ldap-id-attribute",
        "sAMAccountName",
        "--ldap-starttls",
        "--connect-timeout",
        "3s",
    ]);
    assert!(cfg.debug);
    assert_eq!(cfg.interval, Some(Duration::from_secs(900)));
    assert_eq!(cfg.log_format, LogFormat::Json);
    assert_eq!(cfg.store.columns, ["givenName", "sn", "mail"]);
    assert_eq!(cfg.store.table, "accounts");
    assert_eq!(cfg.store.key_column, "login");
    assert_eq!(cfg.directory.bind_dn.as_deref(), Some("cn=sync,dc=example,dc=org"));
    assert_eq!(cfg.directory.bind_password.as_deref(), Some("secret"));
    assert_eq!(cfg.directory.id_attribute, "sAMAccountName");
    assert!(cfg.directory.starttls);
    assert_eq!(cfg.store.connect_timeout, Duration::from_secs(3));
}

#[test]
fn attribute_list_is_trimmed_and_deduplicated() {
    let cfg = load(&["--attributes", " mail, cn ,,mail,sn "]);
    assert_eq!(cfg.store.columns, ["mail", "cn", "sn"]);
}

#[test]
fn blank_attribute_list_is_rejected() {
    let err = parse(&["--attributes", " , "])
        .expect("arguments")
        .into_config()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "SYNC_ATTRIBUTES", .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Interval parsing
// ---------------------------------------------------------------------------

#[rstest]
#[case("2s", Duration::from_secs(2))]
#[case("90s", Duration::from_secs(90))]
#[case("1h30m", Duration::from_secs(5400))]
#[case(" 5m ", Duration::from_secs(300))]
#[case("+5m", Duration::from_secs(300))]
#[case("250ms", Duration::from_millis(250))]
fn valid_intervals_parse(#[case] raw: &str, #[case] expected: Duration) {
    assert_eq!(parse_interval(raw).expect("interval"), expected);
}

#[rstest]
#[case("0s")]
#[case("+0s")]
#[case("-5m")]
#[case("-1h30m")]
fn non_positive_intervals_are_rejected(#[case] raw: &str) {
    let err = parse_interval(raw).unwrap_err();
    assert!(matches!(err, ConfigError::NonPositiveInterval { .. }), "got: {err}");
}

#[rstest]
#[case("soon")]
#[case("")]
#[case("5 parsecs")]
#[case("-banana")]
#[case("+")]
fn malformed_intervals_are_rejected(#[case] raw: &str) {
    let err = parse_interval(raw).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedInterval { .. }), "got: {err}");
    assert!(err.to_string().contains("SYNC_INTERVAL"));
}

#[test]
fn bad_interval_fails_the_whole_parse() {
    let err = rejected(&["--interval", "every now and then"]);
    assert!(
        matches!(config_error(&err), ConfigError::MalformedInterval { .. }),
        "got: {err}"
    );
}

#[test]
fn negative_interval_fails_the_whole_parse() {
    let err = rejected(&["--interval", "-5m"]);
    assert!(
        matches!(config_error(&err), ConfigError::NonPositiveInterval { value, .. } if value == "-5m"),
        "got: {err}"
    );
}

// ---------------------------------------------------------------------------
// 3. Validation failures
// ---------------------------------------------------------------------------

#[rstest]
#[case("--database-url")]
#[case("--ldap-url")]
#[case("--ldap-base-dn")]
fn required_settings_must_be_present(#[case] flag: &str) {
    let err = match TestCli::try_parse_from(base_without(flag)) {
        Ok(_) => panic!("expected {flag} to be required"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert!(err.to_string().contains(flag), "got: {err}");
}

#[test]
fn empty_required_setting_is_rejected() {
    let mut args = base_without("--database-url");
    args.extend(["--database-url", ""]);
    let err = TestCli::try_parse_from(args).err().expect("empty URL");
    assert_eq!(err.kind(), ErrorKind::InvalidValue, "got: {err}");
}

#[rstest]
#[case("--sql-table", "users; drop table users")]
#[case("--sql-key-column", "\"uid\"")]
#[case("--attributes", "mail,given-name")]
fn unsafe_identifiers_are_rejected(#[case] flag: &str, #[case] value: &str) {
    let err = rejected(&[flag, value]);
    assert!(
        matches!(config_error(&err), ConfigError::InvalidIdentifier { .. }),
        "got: {err}"
    );
}

#[test]
fn non_ldap_url_is_rejected() {
    let mut args = base_without("--ldap-url");
    args.extend(["--ldap-url", "https://ldap.example.org"]);
    let err = TestCli::try_parse_from(args).err().expect("non-LDAP URL");
    assert_eq!(err.kind(), ErrorKind::ValueValidation, "got: {err}");
    assert!(
        matches!(config_error(&err), ConfigError::Invalid { key: "SYNC_LDAP_URL", .. }),
        "got: {err}"
    );
}

#[test]
fn unknown_log_format_is_rejected() {
    let err = parse(&["--log-format", "xml"]).err().expect("unknown format");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn zero_connect_timeout_is_rejected() {
    let err = rejected(&["--connect-timeout", "0s"]);
    assert!(
        matches!(config_error(&err), ConfigError::Invalid { key: "SYNC_CONNECT_TIMEOUT", .. }),
        "got: {err}"
    );
}
