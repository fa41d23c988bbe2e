//! Process-wide log subscriber, installed once before the first sync run.

use tracing_subscriber::{fmt, EnvFilter};

use ldapsync_core::{LogFormat, SyncConfig};

const DEBUG_DIRECTIVES: &str = "debug,sqlx=info";
const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn";

/// Install the global subscriber described by `config`.
///
/// `SYNC_DEBUG` forces the `debug` level, which logs attribute values. Without
/// it the level comes from `RUST_LOG`, falling back to `info`. Calling this
/// more than once keeps the first subscriber.
pub fn init_tracing(config: &SyncConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(config.debug, rust_log.as_deref());

    // stdout is reserved for command output such as `ldapsync diff --json`.
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match config.log_format {
        LogFormat::Text => builder.without_time().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// `sqlx` stays one level quieter than everything else. An unparsable
/// `rust_log` falls back to the default directives.
fn env_filter(debug: bool, rust_log: Option<&str>) -> EnvFilter {
    if debug {
        return EnvFilter::new(DEBUG_DIRECTIVES);
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
