//! Node commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use fleet_store::{FleetError, NodeStatus, NodesStore};

fn open_store(client: &Client) -> NodesStore {
    NodesStore::load(client.durable.clone(), client.api.clone())
}

/// List nodes. In a signed-in cloud session the list is fetched first.
pub async fn nodes_list(
    client: &Client,
    status: Option<NodeStatus>,
    format: &OutputFormat,
) -> Result<()> {
    let store = open_store(client);
    if client.is_cloud_session() {
        store.fetch_nodes().await;
        if let Some(error) = store.snapshot().error {
            output::print_error(&format!("Could not refresh nodes: {}", error), format);
        }
    }

    let nodes = match status {
        Some(status) => store.nodes_by_status(status),
        None => store.all_nodes(),
    };

    match format {
        OutputFormat::Text => {
            if nodes.is_empty() {
                println!("No nodes found");
            } else {
                println!(
                    "{:<24} {:<20} {:<10} {:<12} {:<14} {}",
                    "ID", "Name", "Provider", "Region", "Status", "Deployments"
                );
                println!("{}", "-".repeat(100));
                for node in &nodes {
                    println!(
                        "{:<24} {:<20} {:<10} {:<12} {:<14} {}",
                        node.id,
                        node.name,
                        node.provider,
                        node.region,
                        node.status,
                        node.active_deployments
                    );
                }
            }
        }
        OutputFormat::Json => output::print_json(&nodes)?,
    }
    Ok(())
}

/// Show one node from the local store.
pub async fn nodes_show(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let store = open_store(client);
    let Some(node) = store.get_node(id) else {
        let err = FleetError::NotFound {
            kind: "Node",
            id: id.to_string(),
        };
        output::print_error(&err.to_string(), format);
        return Ok(());
    };

    match format {
        OutputFormat::Text => {
            output::print_heading(&node.name);
            output::print_row("ID", &node.id);
            output::print_row("Provider", node.provider.as_str());
            output::print_row("Endpoint", &node.endpoint);
            output::print_row("Region", &node.region);
            output::print_row("Status", node.status.as_str());
            output::print_row(
                "CPU",
                &format!(
                    "{} cores, {:.1}% used",
                    node.capabilities.cpu_cores, node.health.cpu_percent
                ),
            );
            output::print_row(
                "Memory",
                &format!(
                    "{} GB, {:.1}% used",
                    node.capabilities.memory_gb, node.health.memory_percent
                ),
            );
            output::print_row("Uptime", &format!("{}s", node.health.uptime));
            output::print_row("Deployments", &node.active_deployments.to_string());
            output::print_row("Created", &output::format_millis(node.created_at));
        }
        OutputFormat::Json => output::print_json(&node)?,
    }
    Ok(())
}

/// Remove a node: through the API in a cloud session, locally otherwise.
pub async fn nodes_remove(client: &Client, id: &str, format: &OutputFormat) -> Result<()> {
    let store = open_store(client);

    if client.is_cloud_session() {
        match store.delete_node(id).await {
            Ok(()) => output::print_success(&format!("Node {} removed", id), format),
            Err(e) => output::print_error(&e.to_string(), format),
        }
    } else if store.remove_node(id) {
        output::print_success(&format!("Node {} removed", id), format);
    } else {
        output::print_error(
            &FleetError::NotFound {
                kind: "Node",
                id: id.to_string(),
            }
            .to_string(),
            format,
        );
    }
    Ok(())
}
