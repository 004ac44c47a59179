use std::{path::Path, sync::LazyLock};

use anyhow::{anyhow, Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";
pub const TRACKER_PREFIX: &str = "tracker";

const DEFAULT_LEVEL: &str = "info";
const LOG_FILES_KEPT: usize = 5;

/// Picks the level for this crate's logs. An explicit `--log-filter` wins over `RUST_LOG`.
fn resolve_level(log_level: Option<LevelFilter>, env_level: Option<String>) -> String {
    log_level
        .map(|v| v.to_string())
        .or(env_level.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LEVEL.into())
}

/// Installs the global subscriber. Everything goes into a daily rolling file named after `prefix`
/// inside `log_dir`. With `show_std` the same lines are also printed to stdout, which is how a
/// tracker running in the foreground shows transitions as they happen.
pub fn enable_logging(
    prefix: &str,
    log_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(LOG_FILES_KEPT)
        .filename_prefix(prefix)
        .build(log_dir)
        .with_context(|| format!("Failed to open logs in {log_dir:?}"))?;
    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let level = resolve_level(log_level, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::new(format!(
        "{}={level}",
        env!("CARGO_PKG_NAME").replace('-', "_")
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(stdout.and(appender))
        .try_init()
        .map_err(|e| anyhow!("Logging was already initialized: {e}"))?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::resolve_level;

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level(None, None), "info");
        assert_eq!(resolve_level(None, Some("trace".into())), "trace");
        assert_eq!(resolve_level(None, Some(" ".into())), "info");
        assert_eq!(
            resolve_level(Some(LevelFilter::WARN), Some("trace".into())),
            "warn"
        );
    }
}
