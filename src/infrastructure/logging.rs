use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{config::AppConfig, infrastructure::directories::ResolvedPaths};

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const LOG_FILE: &str = "jobmail.log";

/// HTTP plumbing that floods debug output with connection chatter.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "h2=warn", "rustls=warn", "reqwest=info"];

/// Filter from `RUST_LOG` when set, otherwise from `level` with the HTTP stack
/// held back. Returns the rejected level when it could not be parsed.
fn build_filter(rust_log: Option<&str>, level: &str) -> (EnvFilter, Option<String>) {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return (filter, None);
        }
    }

    let (base, rejected) = match EnvFilter::try_new(level) {
        Ok(_) => (level.to_string(), None),
        Err(_) => ("info".to_string(), Some(level.to_string())),
    };
    let directives = std::iter::once(base.as_str())
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",");
    (EnvFilter::new(directives), rejected)
}

/// Compact console output on stderr plus a daily-rolling file. Stdout is left
/// to command results.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let (filter, rejected) = build_filter(rust_log.as_deref(), &config.logging.level);

        let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, LOG_FILE);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = GUARD.set(guard);

        let console_layer = fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(true);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        if let Some(level) = rejected {
            tracing::warn!(level = %level, "LOG_LEVEL is not a valid filter, using info");
        }
        tracing::debug!(logs = %paths.logs_dir.join(LOG_FILE).display(), "tracing initialized");
        Ok(())
    })?;
    Ok(())
}
