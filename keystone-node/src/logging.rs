use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::filter_fn, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,keystone_node=debug";

/// Installs the global subscriber.
///
/// Human-readable output goes to stderr, filtered by `RUST_LOG`. When
/// `audit_log` is given, `consensus`-target events are also appended to that
/// file. Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_tracing(audit_log: Option<&Path>) -> Option<WorkerGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with_filter(filter_fn(|metadata| metadata.target() != "consensus"));

    let (audit_layer, guard) = match audit_log {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|f| f.to_os_string())
                .unwrap_or_else(|| "audit.log".into());

            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter_fn(|metadata| metadata.target() == "consensus"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(console_layer)
        .init();

    guard
}
