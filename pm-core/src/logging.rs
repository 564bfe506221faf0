//! `tracing` subscriber setup: compact stderr output plus a daily-rotated
//! log file, plain or JSON.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::PmResult;

const LOG_FILE_PREFIX: &str = "propman.log";

/// Targets that follow the configured level. Everything else (hyper,
/// reqwest, r2d2, ...) stays at `warn`.
const APP_TARGETS: &[&str] = &[
    "propman",
    "pm_core",
    "pm_models",
    "pm_llm",
    "pm_services",
    "pm_server",
    "tower_http",
];

/// Expand the configured level into a filter directive.
///
/// A bare level such as `debug` becomes `warn,pm_core=debug,...`. A value
/// containing `=` or `,` is already a directive and passes through.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    std::iter::once("warn".to_string())
        .chain(APP_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// `RUST_LOG` wins when set; otherwise the expanded configured level.
fn build_filter(level: &str) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    EnvFilter::try_new(filter_directive(level)).unwrap_or_else(|_| EnvFilter::new(filter_directive("info")))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes the file writer.
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> PmResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let json_file = json_output.then(|| {
        fmt::layer()
            .with_writer(writer.clone())
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
    });
    let plain_file = (!json_output).then(|| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console)
        .with(json_file)
        .with(plain_file)
        .init();

    tracing::info!(level, dir = %log_dir.display(), json = json_output, "logging initialized");

    Ok(LogGuard { _guard: guard })
}

/// Keeps the non-blocking file writer alive.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Stderr-only logger. Later calls are no-ops.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
