//! Compute node models.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Initializing,
    Ready,
    Busy,
    Degraded,
    Failed,
    Removed,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Initializing => "initializing",
            NodeStatus::Ready => "ready",
            NodeStatus::Busy => "busy",
            NodeStatus::Degraded => "degraded",
            NodeStatus::Failed => "failed",
            NodeStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Render,
    Railway,
    Flyio,
    Vercel,
    Netlify,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Render => "render",
            CloudProvider::Railway => "railway",
            CloudProvider::Flyio => "flyio",
            CloudProvider::Vercel => "vercel",
            CloudProvider::Netlify => "netlify",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealth {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Seconds.
    pub uptime: u64,
    /// Milliseconds since the epoch.
    pub last_heartbeat: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCapabilities {
    pub cpu_cores: u32,
    pub memory_gb: f64,
    pub disk_gb: f64,
    pub network_bandwidth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub active_requests: u64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub provider: CloudProvider,
    pub endpoint: String,
    pub region: String,
    pub status: NodeStatus,
    pub health: NodeHealth,
    pub capabilities: NodeCapabilities,
    pub created_at: i64,
    #[serde(default)]
    pub active_deployments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NodeMetrics>,
}

/// Partial node update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub status: Option<NodeStatus>,
    pub health: Option<NodeHealth>,
    pub capabilities: Option<NodeCapabilities>,
    pub active_deployments: Option<u32>,
    pub metrics: Option<NodeMetrics>,
}

impl NodeUpdate {
    pub fn status(status: NodeStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, node: &mut Node) {
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(endpoint) = self.endpoint {
            node.endpoint = endpoint;
        }
        if let Some(region) = self.region {
            node.region = region;
        }
        if let Some(status) = self.status {
            node.status = status;
        }
        if let Some(health) = self.health {
            node.health = health;
        }
        if let Some(capabilities) = self.capabilities {
            node.capabilities = capabilities;
        }
        if let Some(active) = self.active_deployments {
            node.active_deployments = active;
        }
        if let Some(metrics) = self.metrics {
            node.metrics = Some(metrics);
        }
    }
}

/// Body of `POST /nodes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub provider: CloudProvider,
    pub endpoint: String,
    pub region: String,
    /// Provider credentials, passed through untouched.
    pub credentials: serde_json::Map<String, serde_json::Value>,
    pub capabilities: NodeCapabilities,
}

#[cfg(test)]
pub(crate) fn sample_node(id: &str, provider: CloudProvider, status: NodeStatus) -> Node {
    Node {
        id: id.to_string(),
        name: format!("node-{id}"),
        provider,
        endpoint: format!("https://{id}.example.com"),
        region: "us-east".to_string(),
        status,
        health: NodeHealth::default(),
        capabilities: NodeCapabilities {
            cpu_cores: 2,
            memory_gb: 4.0,
            disk_gb: 20.0,
            network_bandwidth: "1Gbps".to_string(),
        },
        created_at: 1_714_557_600_000,
        active_deployments: 0,
        metrics: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let node = sample_node("n1", CloudProvider::Flyio, NodeStatus::Ready);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["provider"], "flyio");
        assert_eq!(value["status"], "ready");
        assert_eq!(value["capabilities"]["cpuCores"], 2);
        assert_eq!(value["createdAt"], json!(1_714_557_600_000i64));
        assert!(value.get("metrics").is_none());
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut node = sample_node("n1", CloudProvider::Render, NodeStatus::Initializing);
        NodeUpdate {
            region: Some("eu-west".to_string()),
            ..NodeUpdate::status(NodeStatus::Ready)
        }
        .apply(&mut node);

        assert_eq!(node.status, NodeStatus::Ready);
        assert_eq!(node.region, "eu-west");
        assert_eq!(node.name, "node-n1");
    }
}
