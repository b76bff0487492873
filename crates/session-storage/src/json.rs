//! Typed JSON helpers over any [`KeyValueStore`].

use crate::{KeyValueStore, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Load and decode a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, StorageError};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        selected: Option<String>,
        count: u32,
    }

    #[test]
    fn test_missing_key_loads_none() {
        let store = MemoryStorage::new();
        let loaded: Option<Snapshot> = load_json(&store, "absent").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_value_is_encoding_error() {
        let store = MemoryStorage::new();
        store.set("snap", "{not json").unwrap();
        let result: StorageResult<Option<Snapshot>> = load_json(&store, "snap");
        assert!(matches!(result, Err(StorageError::Encoding(_))));
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStorage::new();
        let snap = Snapshot {
            selected: Some("node-1".to_string()),
            count: 2,
        };
        save_json(&store, "snap", &snap).unwrap();
        assert_eq!(load_json::<Snapshot>(&store, "snap").unwrap(), Some(snap));
    }
}
