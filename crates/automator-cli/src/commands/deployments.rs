//! Deployment commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use fleet_store::{DeploymentStatus, DeploymentsStore, FleetError};

fn open_store(client: &Client) -> DeploymentsStore {
    DeploymentsStore::load(client.durable.clone(), client.api.clone())
}

fn not_found(id: &str) -> String {
    FleetError::NotFound {
        kind: "Deployment",
        id: id.to_string(),
    }
    .to_string()
}

/// List deployments, optionally filtered by status or target node.
pub async fn deployments_list(
    client: &Client,
    status: Option<DeploymentStatus>,
    node: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let store = open_store(client);
    if client.is_cloud_session() {
        store.fetch_deployments().await;
        if let Some(error) = store.snapshot().error {
            output::print_error(&format!("Could not refresh deployments: {}", error), format);
        }
    }

    let mut deployments = match node {
        Some(node_id) => store.deployments_by_node(node_id),
        None => store.all_deployments(),
    };
    if let Some(status) = status {
        deployments.retain(|d| d.status == status);
    }

    match format {
        OutputFormat::Text => {
            if deployments.is_empty() {
                println!("No deployments found");
            } else {
                println!(
                    "{:<24} {:<20} {:<8} {:<10} {:<10} {}",
                    "ID", "Name", "Runtime", "Status", "Instances", "Updated"
                );
                println!("{}", "-".repeat(100));
                for d in &deployments {
                    println!(
                        "{:<24} {:<20} {:<8} {:<10} {:<10} {}",
                        d.id,
                        d.name,
                        d.runtime,
                        d.status,
                        d.instances,
                        output::format_millis(d.updated_at)
                    );
                }
            }
        }
        OutputFormat::Json => output::print_json(&deployments)?,
    }
    Ok(())
}

pub async fn deployments_show(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let store = open_store(client);
    let Some(deployment) = store.get_deployment(id) else {
        output::print_error(&not_found(id), format);
        return Ok(());
    };

    match format {
        OutputFormat::Text => {
            output::print_heading(&deployment.name);
            output::print_row("ID", &deployment.id);
            output::print_row("Runtime", &deployment.runtime.to_string());
            output::print_row("Status", deployment.status.as_str());
            output::print_row(
                "Source",
                deployment.source_url.as_deref().unwrap_or("-"),
            );
            output::print_row("Entrypoint", &deployment.entrypoint);
            if let Some(port) = deployment.port {
                output::print_row("Port", &port.to_string());
            }
            output::print_row("Instances", &deployment.instances.to_string());
            output::print_row("Nodes", &deployment.target_node_ids.join(", "));
            for var in &deployment.env_vars {
                let value = if var.is_secret() { "********" } else { var.value.as_str() };
                output::print_row(&format!("env {}", var.key), value);
            }
            output::print_row("Created", &output::format_millis(deployment.created_at));
            output::print_row("Updated", &output::format_millis(deployment.updated_at));
        }
        OutputFormat::Json => output::print_json(&deployment)?,
    }
    Ok(())
}

/// Remove a deployment: through the API in a cloud session, locally otherwise.
pub async fn deployments_remove(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let store = open_store(client);

    if client.is_cloud_session() {
        match store.delete_deployment(id).await {
            Ok(()) => output::print_success(&format!("Deployment {} removed", id), format),
            Err(e) => output::print_error(&e.to_string(), format),
        }
    } else if store.remove_deployment(id) {
        output::print_success(&format!("Deployment {} removed", id), format);
    } else {
        output::print_error(&not_found(id), format);
    }
    Ok(())
}
