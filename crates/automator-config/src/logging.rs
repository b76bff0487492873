//! Logging initialization for client binaries.
//!
//! Thin wrapper over the `observability` package so every binary writes the
//! same structured JSONL to `~/.automator67/logs/client.jsonl`.

/// Initialize logging for a client binary.
///
/// Log level comes from `RUST_LOG` when set, otherwise `level`. An empty
/// level falls back to [`DEFAULT_LOG_LEVEL`](crate::DEFAULT_LOG_LEVEL).
pub fn init_logging(service_name: &str, level: &str, also_stderr: bool) {
    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: effective_level(level).into(),
        also_stderr,
        ..Default::default()
    });
}

fn effective_level(level: &str) -> &str {
    let level = level.trim();
    if level.is_empty() {
        crate::DEFAULT_LOG_LEVEL
    } else {
        level
    }
}
