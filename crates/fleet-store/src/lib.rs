//! Client-side stores for compute nodes and deployments.
//!
//! Each store keeps its whole state in memory and writes it through to a
//! [`KeyValueStore`](session_storage::KeyValueStore) after every change.
//! API operations go through the session's
//! [`AuthenticatedApiClient`](auth_session::AuthenticatedApiClient).

mod deployment;
mod deployments;
mod envelope;
mod error;
mod node;
mod nodes;
mod persisted;

#[cfg(test)]
pub(crate) mod test_support;

pub use deployment::{
    AppRuntime, AppType, CreateDeploymentRequest, Deployment, DeploymentReplica,
    DeploymentStatus, DeploymentUpdate, EnvVar, HealthCheck, Resources,
};
pub use deployments::{DeploymentsState, DeploymentsStore};
pub use envelope::ApiEnvelope;
pub use error::{FleetError, FleetResult};
pub use node::{
    CloudProvider, CreateNodeRequest, Node, NodeCapabilities, NodeHealth, NodeMetrics,
    NodeStatus, NodeUpdate,
};
pub use nodes::{NodesState, NodesStore};

/// Milliseconds since the Unix epoch, the timestamp unit of all models.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
