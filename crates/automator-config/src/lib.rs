//! Configuration, filesystem layout, and logging setup for the Automator67 client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_APP_ORIGIN, DEFAULT_LOG_LEVEL, ENV_API_BASE_URL,
    ENV_APP_ORIGIN, ENV_GITHUB_CLIENT_ID, ENV_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
