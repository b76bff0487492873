//! Mode selection commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session::{can_access_dashboard, AppMode};

/// Show the selected mode and whether its dashboard is reachable.
pub fn mode_show(client: &Client, format: &OutputFormat) -> Result<()> {
    let mode = client.modes.get();
    let session = client.session.store().snapshot();
    let dashboard = mode.is_some_and(|m| can_access_dashboard(m, mode, &session));

    match format {
        OutputFormat::Text => {
            println!(
                "Mode:      {}",
                mode.map(|m| m.as_str()).unwrap_or("not selected")
            );
            println!("Dashboard: {}", if dashboard { "available" } else { "locked" });
            if mode == Some(AppMode::Cloud) && !session.is_authenticated {
                println!("Sign in with 'automator67 login' or 'automator67 oauth start'.");
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "mode": mode,
            "dashboard_available": dashboard,
        }))?,
    }
    Ok(())
}

pub fn mode_set(client: &Client, mode: AppMode, format: &OutputFormat) -> Result<()> {
    client.modes.set(mode)?;
    output::print_success(&format!("Mode set to {}", mode), format);
    Ok(())
}

/// Forget the selected mode. The session is left alone.
pub fn mode_reset(client: &Client, format: &OutputFormat) -> Result<()> {
    client.modes.clear()?;
    output::print_success("Mode cleared", format);
    Ok(())
}
