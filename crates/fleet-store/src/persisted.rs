//! Write-through state cell shared by the fleet stores.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use session_storage::{load_json, save_json, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct Persisted<S> {
    state: RwLock<S>,
    storage: Arc<dyn KeyValueStore>,
    key: &'static str,
}

impl<S> Persisted<S>
where
    S: Serialize + DeserializeOwned + Default + Clone,
{
    /// Load from `key`; missing or unreadable data starts from the default.
    pub fn load(storage: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        let state = match load_json::<S>(storage.as_ref(), key) {
            Ok(Some(state)) => state,
            Ok(None) => S::default(),
            Err(e) => {
                warn!(key, error = %e, "Stored state unreadable, starting empty");
                S::default()
            }
        };
        debug!(key, "Store loaded");
        Self {
            state: RwLock::new(state),
            storage,
            key,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.read())
    }

    /// Mutate, then persist the whole state. Storage failures are logged only.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = f(&mut state);
            (result, state.clone())
        };
        if let Err(e) = save_json(self.storage.as_ref(), self.key, &snapshot) {
            warn!(key = self.key, error = %e, "Failed to persist store");
        }
        result
    }

    pub fn snapshot(&self) -> S {
        self.state.read().clone()
    }
}
