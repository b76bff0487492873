//! Automator67 CLI - sign in, manage the client session and inspect the fleet.

mod commands;
mod output;

use auth_session::AppMode;
use automator_config::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use fleet_store::{DeploymentStatus, NodeStatus};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Automator67 CLI - sign in and manage nodes and deployments.
#[derive(Parser)]
#[command(name = "automator67")]
#[command(about = "Automator67 CLI for authentication, nodes and deployments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or choose local/cloud mode
    Mode {
        #[command(subcommand)]
        command: ModeCommands,
    },

    /// Login with email and password
    Login,

    /// Create an account with email and password
    Signup,

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Refresh the access token now
    Refresh,

    /// Show the signed-in user's profile
    Profile,

    /// Sign in with GitHub
    Oauth {
        #[command(subcommand)]
        command: OauthCommands,
    },

    /// Manage nodes
    Nodes {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Manage deployments
    Deployments {
        #[command(subcommand)]
        command: DeploymentCommands,
    },
}

#[derive(Subcommand)]
enum ModeCommands {
    /// Show the selected mode
    Show,
    /// Run offline with local data only
    Local,
    /// Use the backend; requires sign-in
    Cloud,
    /// Forget the selected mode
    Reset,
}

#[derive(Subcommand)]
enum OauthCommands {
    /// Print (and open) the GitHub authorize URL
    Start {
        /// Do not try to open a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Complete sign-in from the redirected callback URL
    Callback {
        /// Full callback URL, or its path and query
        url: String,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// List nodes
    List {
        /// Filter by status
        #[arg(short, long, value_parser = parse_lowercase::<NodeStatus>)]
        status: Option<NodeStatus>,
    },
    /// Show node details
    Show {
        /// Node ID
        id: String,
    },
    /// Remove a node
    Remove {
        /// Node ID
        id: String,
    },
}

#[derive(Subcommand)]
enum DeploymentCommands {
    /// List deployments
    List {
        /// Filter by status
        #[arg(short, long, value_parser = parse_lowercase::<DeploymentStatus>)]
        status: Option<DeploymentStatus>,
        /// Only deployments targeting this node
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Show deployment details
    Show {
        /// Deployment ID
        id: String,
    },
    /// Remove a deployment
    Remove {
        /// Deployment ID
        id: String,
    },
}

/// Parse a lowercase wire name (e.g. `ready`) into its enum.
fn parse_lowercase<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown value '{}'", value))
}

async fn run(cli: Cli, client: commands::Client) -> anyhow::Result<()> {
    let format = &cli.format;
    match cli.command {
        Commands::Mode { command } => match command {
            ModeCommands::Show => commands::mode_show(&client, format),
            ModeCommands::Local => commands::mode_set(&client, AppMode::Local, format),
            ModeCommands::Cloud => commands::mode_set(&client, AppMode::Cloud, format),
            ModeCommands::Reset => commands::mode_reset(&client, format),
        },
        Commands::Login => commands::login(&client, format).await,
        Commands::Signup => commands::signup(&client, format).await,
        Commands::Logout => commands::logout(&client, format).await,
        Commands::Status => commands::status(&client, format).await,
        Commands::Refresh => commands::refresh(&client, format).await,
        Commands::Profile => commands::profile(&client, format).await,
        Commands::Oauth { command } => match command {
            OauthCommands::Start { no_browser } => {
                commands::oauth_start(&client, no_browser, format).await
            }
            OauthCommands::Callback { url } => commands::oauth_callback(&client, &url, format).await,
        },
        Commands::Nodes { command } => match command {
            NodeCommands::List { status } => commands::nodes_list(&client, status, format).await,
            NodeCommands::Show { id } => commands::nodes_show(&client, &id, format).await,
            NodeCommands::Remove { id } => commands::nodes_remove(&client, &id, format).await,
        },
        Commands::Deployments { command } => match command {
            DeploymentCommands::List { status, node } => {
                commands::deployments_list(&client, status, node.as_deref(), format).await
            }
            DeploymentCommands::Show { id } => {
                commands::deployments_show(&client, &id, format).await
            }
            DeploymentCommands::Remove { id } => {
                commands::deployments_remove(&client, &id, format).await
            }
        },
    }
}

fn setup() -> anyhow::Result<(Paths, Config)> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;
    Ok((paths, config))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (paths, config) = match setup() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    // CLI output goes to stdout; logs only go to the JSONL file.
    init_logging("cli", &level, false);
    debug!(api = %config.api_base_url, "CLI starting");

    let result = match commands::Client::new(&paths, config) {
        Ok(client) => run(cli, client).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_filters_and_format() {
        let cli = Cli::try_parse_from([
            "automator67",
            "--format",
            "json",
            "nodes",
            "list",
            "--status",
            "Ready",
        ])
        .unwrap();
        assert_eq!(cli.format, output::OutputFormat::Json);
        match cli.command {
            Commands::Nodes {
                command: NodeCommands::List { status },
            } => assert_eq!(status, Some(NodeStatus::Ready)),
            _ => panic!("expected nodes list"),
        }

        assert!(Cli::try_parse_from(["automator67", "deployments", "list", "-s", "sleeping"]).is_err());
    }

    #[test]
    fn test_oauth_callback_takes_url() {
        let cli = Cli::try_parse_from([
            "automator67",
            "oauth",
            "callback",
            "/auth/github/callback?code=c&state=s",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Oauth {
                command: OauthCommands::Callback { .. }
            }
        ));
    }
}
