//! Nodes store.

use crate::envelope::ApiEnvelope;
use crate::error::{FleetError, FleetResult};
use crate::node::{CloudProvider, CreateNodeRequest, Node, NodeStatus, NodeUpdate};
use crate::persisted::Persisted;
use auth_session::AuthenticatedApiClient;
use serde::{Deserialize, Serialize};
use session_storage::{KeyValueStore, StorageKeys};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodesState {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub selected_node_id: Option<String>,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl NodesState {
    fn remove(&mut self, node_id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != node_id);
        if self.selected_node_id.as_deref() == Some(node_id) {
            self.selected_node_id = None;
        }
        self.nodes.len() != before
    }
}

pub struct NodesStore {
    inner: Persisted<NodesState>,
    api: AuthenticatedApiClient,
}

impl NodesStore {
    /// Load persisted nodes from `storage` (`nodes-storage`).
    pub fn load(storage: Arc<dyn KeyValueStore>, api: AuthenticatedApiClient) -> Self {
        Self {
            inner: Persisted::load(storage, StorageKeys::NODES),
            api,
        }
    }

    pub fn snapshot(&self) -> NodesState {
        self.inner.snapshot()
    }

    pub fn add_node(&self, node: Node) {
        self.inner.update(|s| s.nodes.push(node));
    }

    /// Remove a node, clearing the selection if it pointed at it.
    pub fn remove_node(&self, node_id: &str) -> bool {
        self.inner.update(|s| s.remove(node_id))
    }

    pub fn update_node(&self, node_id: &str, update: NodeUpdate) -> bool {
        self.inner.update(|s| match s.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                update.apply(node);
                true
            }
            None => false,
        })
    }

    pub fn get_node(&self, node_id: &str) -> Option<Node> {
        self.inner
            .read(|s| s.nodes.iter().find(|n| n.id == node_id).cloned())
    }

    pub fn select_node(&self, node_id: Option<&str>) {
        self.inner
            .update(|s| s.selected_node_id = node_id.map(str::to_string));
    }

    pub fn selected_node(&self) -> Option<Node> {
        self.inner.read(|s| {
            let id = s.selected_node_id.as_deref()?;
            s.nodes.iter().find(|n| n.id == id).cloned()
        })
    }

    pub fn all_nodes(&self) -> Vec<Node> {
        self.inner.read(|s| s.nodes.clone())
    }

    pub fn nodes_by_provider(&self, provider: CloudProvider) -> Vec<Node> {
        self.filtered(|n| n.provider == provider)
    }

    pub fn nodes_by_status(&self, status: NodeStatus) -> Vec<Node> {
        self.filtered(|n| n.status == status)
    }

    fn filtered(&self, keep: impl Fn(&Node) -> bool) -> Vec<Node> {
        self.inner
            .read(|s| s.nodes.iter().filter(|n| keep(n)).cloned().collect())
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

    pub fn set_nodes(&self, nodes: Vec<Node>) {
        self.inner.update(|s| s.nodes = nodes);
    }

    pub fn clear_nodes(&self) {
        self.inner.update(|s| {
            s.nodes.clear();
            s.selected_node_id = None;
        });
    }

    fn begin_request(&self) {
        self.inner.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn fail_request(&self, action: &str, err: &FleetError) {
        warn!(error = %err, action, "Nodes request failed");
        let message = err.to_string();
        self.inner.update(|s| {
            s.error = Some(message);
            s.is_loading = false;
        });
    }

    /// Replace the local list with `GET /nodes`.
    ///
    /// Failures land in the store's `error` and are not returned.
    pub async fn fetch_nodes(&self) {
        self.begin_request();
        match self.api.get::<ApiEnvelope<Vec<Node>>>("/nodes").await {
            Ok(envelope) => {
                info!(count = envelope.data.len(), "Fetched nodes");
                self.inner.update(|s| {
                    s.nodes = envelope.data;
                    s.is_loading = false;
                });
            }
            Err(e) => self.fail_request("fetch", &e.into()),
        }
    }

    /// `POST /nodes` and append the created node.
    pub async fn create_node(&self, request: &CreateNodeRequest) -> FleetResult<Node> {
        self.begin_request();
        match self
            .api
            .post::<_, ApiEnvelope<Node>>("/nodes", request)
            .await
        {
            Ok(envelope) => {
                let node = envelope.data;
                info!(node_id = %node.id, provider = %node.provider, "Node created");
                let created = node.clone();
                self.inner.update(|s| {
                    s.nodes.push(node);
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

    /// `DELETE /nodes/{id}` and drop it locally.
    pub async fn delete_node(&self, node_id: &str) -> FleetResult<()> {
        self.begin_request();
        let path = format!("/nodes/{node_id}");
        match self.api.delete::<serde_json::Value>(&path).await {
            Ok(_) => {
                info!(node_id, "Node deleted");
                self.inner.update(|s| {
                    s.remove(node_id);
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
