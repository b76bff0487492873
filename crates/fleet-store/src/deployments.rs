//! Deployments store.

use crate::deployment::{CreateDeploymentRequest, Deployment, DeploymentStatus, DeploymentUpdate};
use crate::envelope::ApiEnvelope;
use crate::error::{FleetError, FleetResult};
use crate::now_millis;
use crate::persisted::Persisted;
use auth_session::AuthenticatedApiClient;
use serde::{Deserialize, Serialize};
use session_storage::{KeyValueStore, StorageKeys};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentsState {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(default)]
    pub selected_deployment_id: Option<String>,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl DeploymentsState {
    fn remove(&mut self, deployment_id: &str) -> bool {
        let before = self.deployments.len();
        self.deployments.retain(|d| d.id != deployment_id);
        if self.selected_deployment_id.as_deref() == Some(deployment_id) {
            self.selected_deployment_id = None;
        }
        self.deployments.len() != before
    }
}

pub struct DeploymentsStore {
    inner: Persisted<DeploymentsState>,
    api: AuthenticatedApiClient,
}

impl DeploymentsStore {
    /// Load persisted deployments from `storage` (`deployments-storage`).
    pub fn load(storage: Arc<dyn KeyValueStore>, api: AuthenticatedApiClient) -> Self {
        Self {
            inner: Persisted::load(storage, StorageKeys::DEPLOYMENTS),
            api,
        }
    }

    pub fn snapshot(&self) -> DeploymentsState {
        self.inner.snapshot()
    }

    pub fn add_deployment(&self, deployment: Deployment) {
        self.inner.update(|s| s.deployments.push(deployment));
    }

    pub fn remove_deployment(&self, deployment_id: &str) -> bool {
        self.inner.update(|s| s.remove(deployment_id))
    }

    /// Apply `update` and stamp `updated_at` with the current time.
    pub fn update_deployment(&self, deployment_id: &str, update: DeploymentUpdate) -> bool {
        let now = now_millis();
        self.inner
            .update(|s| match s.deployments.iter_mut().find(|d| d.id == deployment_id) {
                Some(deployment) => {
                    update.apply(deployment, now);
                    true
                }
                None => false,
            })
    }

    pub fn get_deployment(&self, deployment_id: &str) -> Option<Deployment> {
        self.inner
            .read(|s| s.deployments.iter().find(|d| d.id == deployment_id).cloned())
    }

    pub fn select_deployment(&self, deployment_id: Option<&str>) {
        self.inner
            .update(|s| s.selected_deployment_id = deployment_id.map(str::to_string));
    }

    pub fn all_deployments(&self) -> Vec<Deployment> {
        self.inner.read(|s| s.deployments.clone())
    }

    pub fn deployments_by_status(&self, status: DeploymentStatus) -> Vec<Deployment> {
        self.inner.read(|s| {
            s.deployments
                .iter()
                .filter(|d| d.status == status)
                .cloned()
                .collect()
        })
    }

    /// Deployments targeting `node_id`.
    pub fn deployments_by_node(&self, node_id: &str) -> Vec<Deployment> {
        self.inner.read(|s| {
            s.deployments
                .iter()
                .filter(|d| d.targets_node(node_id))
                .cloned()
                .collect()
        })
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.update(|s| s.is_loading = loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.inner.update(|s| s.error = error);
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    pub fn set_deployments(&self, deployments: Vec<Deployment>) {
        self.inner.update(|s| s.deployments = deployments);
    }

    pub fn clear_deployments(&self) {
        self.inner.update(|s| {
            s.deployments.clear();
            s.selected_deployment_id = None;
        });
    }

    fn begin_request(&self) {
        self.inner.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn fail_request(&self, action: &str, err: &FleetError) {
        warn!(error = %err, action, "Deployments request failed");
        let message = err.to_string();
        self.inner.update(|s| {
            s.error = Some(message);
            s.is_loading = false;
        });
    }

    /// Replace the local list with `GET /deployments`. Failures are stored, not returned.
    pub async fn fetch_deployments(&self) {
        self.begin_request();
        match self
            .api
            .get::<ApiEnvelope<Vec<Deployment>>>("/deployments")
            .await
        {
            Ok(envelope) => {
                info!(count = envelope.data.len(), "Fetched deployments");
                self.inner.update(|s| {
                    s.deployments = envelope.data;
                    s.is_loading = false;
                });
            }
            Err(e) => self.fail_request("fetch", &e.into()),
        }
    }

    pub async fn create_deployment(
        &self,
        request: &CreateDeploymentRequest,
    ) -> FleetResult<Deployment> {
        self.begin_request();
        match self
            .api
            .post::<_, ApiEnvelope<Deployment>>("/deployments", request)
            .await
        {
            Ok(envelope) => {
                let deployment = envelope.data;
                info!(deployment_id = %deployment.id, "Deployment created");
                let created = deployment.clone();
                self.inner.update(|s| {
                    s.deployments.push(deployment);
                    s.is_loading = false;
                });
                Ok(created)
            }
            Err(e) => {
                let err = FleetError::from(e);
                self.fail_request("create", &err);
                Err(err)
            }
        }
    }

    pub async fn delete_deployment(&self, deployment_id: &str) -> FleetResult<()> {
        self.begin_request();
        let path = format!("/deployments/{deployment_id}");
        match self.api.delete::<serde_json::Value>(&path).await {
            Ok(_) => {
                info!(deployment_id, "Deployment deleted");
                self.inner.update(|s| {
                    s.remove(deployment_id);
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let err = FleetError::from(e);
                self.fail_request("delete", &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{sample_deployment, AppRuntime, AppType, Resources};
    use crate::test_support::{offline_api, signed_in_api};
    use auth_session::AuthError;
    use serde_json::json;
    use session_storage::MemoryStorage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_filters() {
        let store = DeploymentsStore::load(Arc::new(MemoryStorage::new()), offline_api());
        store.set_deployments(vec![
            sample_deployment("d1", DeploymentStatus::Running, &["n1", "n2"]),
            sample_deployment("d2", DeploymentStatus::Failed, &["n2"]),
            sample_deployment("d3", DeploymentStatus::Running, &["n3"]),
        ]);

        let running: Vec<_> = store
            .deployments_by_status(DeploymentStatus::Running)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(running, vec!["d1", "d3"]);
        assert_eq!(store.deployments_by_node("n2").len(), 2);
        assert!(store.deployments_by_node("n9").is_empty());
    }

    #[test]
    fn test_update_stamps_time_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let store = DeploymentsStore::load(storage.clone(), offline_api());
        store.add_deployment(sample_deployment("d1", DeploymentStatus::Pending, &["n1"]));

        assert!(store.update_deployment("d1", DeploymentUpdate::status(DeploymentStatus::Deploying)));

        let reloaded = DeploymentsStore::load(storage, offline_api());
        let deployment = reloaded.get_deployment("d1").unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Deploying);
        assert!(deployment.updated_at > deployment.created_at);
    }

    #[test]
    fn test_remove_clears_selection() {
        let store = DeploymentsStore::load(Arc::new(MemoryStorage::new()), offline_api());
        store.add_deployment(sample_deployment("d1", DeploymentStatus::Running, &[]));
        store.select_deployment(Some("d1"));

        assert!(store.remove_deployment("d1"));
        assert!(store.snapshot().selected_deployment_id.is_none());
    }

    #[tokio::test]
    async fn test_create_posts_request_and_appends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deployments"))
            .and(body_partial_json(json!({ "name": "api", "appType": "backend", "runtime": "rust" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": sample_deployment("d7", DeploymentStatus::Pending, &["n1"]),
                "requestId": "req-7"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = DeploymentsStore::load(Arc::new(MemoryStorage::new()), signed_in_api(&server.uri()));
        let request = CreateDeploymentRequest {
            name: "api".to_string(),
            app_type: AppType::Backend,
            runtime: AppRuntime::Rust,
            source_url: "https://github.com/example/api".to_string(),
            entrypoint: "./api".to_string(),
            instances: 1,
            target_node_ids: vec!["n1".to_string()],
            resources: Resources {
                memory_limit_mb: 256,
                cpu_limit: 0.25,
                storage_limit_mb: 512,
            },
            env_vars: None,
            health_check: None,
            port: Some(8080),
        };

        let created = store.create_deployment(&request).await.unwrap();
        assert_eq!(created.id, "d7");
        assert_eq!(store.all_deployments().len(), 1);
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test]
    async fn test_rejected_session_surfaces_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/deployments/d1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = DeploymentsStore::load(Arc::new(MemoryStorage::new()), signed_in_api(&server.uri()));
        store.add_deployment(sample_deployment("d1", DeploymentStatus::Running, &[]));

        let err = store.delete_deployment("d1").await.unwrap_err();
        assert!(matches!(err, FleetError::Api(AuthError::AuthenticationRequired)));
        assert_eq!(store.all_deployments().len(), 1);
        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("Authentication required. Please sign in again.")
        );
    }

    #[tokio::test]
    async fn test_fetch_replaces_deployments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/deployments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    sample_deployment("d1", DeploymentStatus::Running, &["n1"]),
                    sample_deployment("d2", DeploymentStatus::Stopped, &["n1"])
                ],
                "timestamp": "2024-05-01T10:00:00Z",
                "requestId": "req-2"
            })))
            .mount(&server)
            .await;

        let store = DeploymentsStore::load(Arc::new(MemoryStorage::new()), signed_in_api(&server.uri()));
        store.fetch_deployments().await;

        assert_eq!(store.deployments_by_node("n1").len(), 2);
        assert!(store.snapshot().error.is_none());
    }
}
