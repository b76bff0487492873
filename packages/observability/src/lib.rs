//! # Observability
//!
//! Centralized structured logging for the Automator67 client.
//!
//! Binaries call `observability::init_with_config` once at
//! startup and use standard `tracing` macros everywhere else. Library crates
//! never install a subscriber themselves.
//!
//! Every event is written as one JSON line to
//! `~/.automator67/logs/client.jsonl`:
//!
//! - `tail -f ~/.automator67/logs/client.jsonl | jq` for pretty JSON
//! - `lnav ~/.automator67/logs/client.jsonl` for interactive exploration
//!
//! Field values are scrubbed before they reach the file: anything keyed like
//! a credential (`access_token`, `password`, `authorization`, ...) or shaped
//! like one (bearer headers, JWTs) is replaced with `[REDACTED]`.
//!
//! ## Example
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "cli".to_string(),
//!     default_level: "debug".to_string(),
//!     ..observability::LogConfig::default()
//! });
//! tracing::info!(mode = "cloud", "client started");
//! ```

mod json_layer;
mod redact;
mod writer;

use std::io;
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use redact::{redact_fields, redact_value, REDACTED};
pub use writer::{CentralLogWriter, WriterFactory};

/// Settings for [`init_with_config`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written as `service` on every line.
    pub service_name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub default_level: String,
    /// Overrides [`default_log_path`].
    pub log_path: Option<PathBuf>,
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            service_name: "automator67".to_string(),
            default_level: "info".to_string(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Default central log file location.
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".automator67")
        .join("logs")
        .join("client.jsonl")
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened the client keeps running with stderr
/// output only. Calling this more than once is a no-op after the first
/// successful install.
pub fn init_with_config(config: LogConfig) {
    if let Err(err) = try_init_with_config(&config) {
        eprintln!(
            "observability: file logging unavailable ({}), falling back to stderr",
            err
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(build_filter(&config.default_level))
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
            .try_init();
    }
}

/// Install the JSONL file layer (plus optional stderr layer).
pub fn try_init_with_config(config: &LogConfig) -> io::Result<()> {
    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);
    let writer = CentralLogWriter::new(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true)
                .with_filter(build_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer.with_filter(build_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init();

    if installed.is_ok() {
        tracing::info!(
            log_path = %log_path.display(),
            service = %config.service_name,
            "observability initialized"
        );
    }
    Ok(())
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
