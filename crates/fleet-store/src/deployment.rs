//! Deployment models.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Deploying,
    Running,
    Updating,
    Failed,
    Stopped,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Updating => "updating",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRuntime {
    Nodejs,
    Python,
    Go,
    Ruby,
    Rust,
    Java,
    Docker,
}

impl fmt::Display for AppRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppRuntime::Nodejs => "nodejs",
            AppRuntime::Python => "python",
            AppRuntime::Go => "go",
            AppRuntime::Ruby => "ruby",
            AppRuntime::Rust => "rust",
            AppRuntime::Java => "java",
            AppRuntime::Docker => "docker",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Backend,
    Worker,
    Cron,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<bool>,
}

impl EnvVar {
    pub fn is_secret(&self) -> bool {
        self.secret.unwrap_or(false)
    }
}

/// Interval and timeout are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    pub interval: u32,
    pub timeout: u32,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub memory_limit_mb: u32,
    /// Fractional cores, e.g. 0.5.
    pub cpu_limit: f64,
    pub storage_limit_mb: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReplica {
    pub id: String,
    pub node_id: String,
    pub status: DeploymentStatus,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub uptime: u64,
    pub last_health_check: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub app_type: AppType,
    pub runtime: AppRuntime,
    pub status: DeploymentStatus,
    /// Git repository or container image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub entrypoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub instances: u32,
    #[serde(default)]
    pub target_node_ids: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
    pub resources: Resources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub replicas: Vec<DeploymentReplica>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

impl Deployment {
    pub fn targets_node(&self, node_id: &str) -> bool {
        self.target_node_ids.iter().any(|id| id == node_id)
    }
}

/// Partial deployment update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeploymentUpdate {
    pub name: Option<String>,
    pub status: Option<DeploymentStatus>,
    pub source_url: Option<String>,
    pub entrypoint: Option<String>,
    pub port: Option<u16>,
    pub instances: Option<u32>,
    pub target_node_ids: Option<Vec<String>>,
    pub env_vars: Option<Vec<EnvVar>>,
    pub resources: Option<Resources>,
    pub health_check: Option<HealthCheck>,
    pub replicas: Option<Vec<DeploymentReplica>>,
    pub logs: Option<String>,
}

impl DeploymentUpdate {
    pub fn status(status: DeploymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply the changes and stamp `updated_at`.
    pub(crate) fn apply(self, deployment: &mut Deployment, now: i64) {
        if let Some(name) = self.name {
            deployment.name = name;
        }
        if let Some(status) = self.status {
            deployment.status = status;
        }
        if let Some(source_url) = self.source_url {
            deployment.source_url = Some(source_url);
        }
        if let Some(entrypoint) = self.entrypoint {
            deployment.entrypoint = entrypoint;
        }
        if let Some(port) = self.port {
            deployment.port = Some(port);
        }
        if let Some(instances) = self.instances {
            deployment.instances = instances;
        }
        if let Some(targets) = self.target_node_ids {
            deployment.target_node_ids = targets;
        }
        if let Some(env_vars) = self.env_vars {
            deployment.env_vars = env_vars;
        }
        if let Some(resources) = self.resources {
            deployment.resources = resources;
        }
        if let Some(health_check) = self.health_check {
            deployment.health_check = Some(health_check);
        }
        if let Some(replicas) = self.replicas {
            deployment.replicas = replicas;
        }
        if let Some(logs) = self.logs {
            deployment.logs = Some(logs);
        }
        deployment.updated_at = now;
    }
}

/// Body of `POST /deployments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub name: String,
    pub app_type: AppType,
    pub runtime: AppRuntime,
    pub source_url: String,
    pub entrypoint: String,
    pub instances: u32,
    pub target_node_ids: Vec<String>,
    pub resources: Resources,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[cfg(test)]
pub(crate) fn sample_deployment(id: &str, status: DeploymentStatus, nodes: &[&str]) -> Deployment {
    Deployment {
        id: id.to_string(),
        name: format!("app-{id}"),
        app_type: AppType::Backend,
        runtime: AppRuntime::Rust,
        status,
        source_url: Some("https://github.com/example/app".to_string()),
        entrypoint: "./app".to_string(),
        port: Some(8080),
        instances: 1,
        target_node_ids: nodes.iter().map(|n| n.to_string()).collect(),
        env_vars: vec![],
        resources: Resources {
            memory_limit_mb: 512,
            cpu_limit: 0.5,
            storage_limit_mb: 1024,
        },
        health_check: None,
        created_at: 1_714_557_600_000,
        updated_at: 1_714_557_600_000,
        replicas: vec![],
        logs: None,
    }
}
