//! GitHub OAuth commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session::{is_callback_url, AppMode, GitHubOAuth, OAuthCallbackProcessor};
use tracing::debug;

/// Start the GitHub flow: stash a state and open the authorize URL.
pub async fn oauth_start(client: &Client, no_browser: bool, format: &OutputFormat) -> Result<()> {
    let oauth = GitHubOAuth::from_config(&client.config, client.session.transient().clone());
    let start = match oauth.start() {
        Ok(start) => start,
        Err(e) => {
            output::print_error(&e.to_string(), format);
            return Ok(());
        }
    };
    let url = start.authorize_url.to_string();

    match format {
        OutputFormat::Text => {
            println!("Open this URL to sign in with GitHub:");
            println!();
            println!("  {}", url);
            println!();
            println!("Then run 'automator67 oauth callback <redirected-url>'.");
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "authorize_url": url,
            "redirect_uri": oauth.redirect_uri()?.to_string(),
        }))?,
    }

    if !no_browser {
        if let Err(e) = open::that(&url) {
            debug!(error = %e, "Could not open browser");
        }
    }
    Ok(())
}

/// Finish the GitHub flow from the URL the browser was redirected to.
pub async fn oauth_callback(client: &Client, callback_url: &str, format: &OutputFormat) -> Result<()> {
    if !is_callback_url(callback_url) {
        output::print_error("Not a GitHub OAuth callback URL", format);
        return Ok(());
    }

    if *format == OutputFormat::Text {
        println!("Completing GitHub sign-in...");
    }
    let outcome = OAuthCallbackProcessor::new(client.session.clone(), client.backend.clone())
        .process(callback_url)
        .await;

    if outcome.is_success() && client.modes.get().is_none() {
        client.modes.set(AppMode::Cloud)?;
    }

    match format {
        OutputFormat::Text => {
            if outcome.is_success() {
                println!("{}", outcome.message);
            } else {
                output::print_error(&outcome.message, format);
            }
        }
        OutputFormat::Json => output::print_json(&outcome)?,
    }

    tokio::time::sleep(outcome.redirect.delay).await;
    if *format == OutputFormat::Text {
        println!("Redirecting to {}", outcome.redirect.target);
    }
    Ok(())
}
