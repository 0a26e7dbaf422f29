//! Key-value persistence for progression and settings
//!
//! Backends:
//! - `MemoryStore`: in-process map (tests, headless runs)
//! - `FileStore`: one JSON file per key in a directory (native only)
//! - `LocalStorage`: browser storage (wasm32 only)
//!
//! Reads never fail loudly: a missing or malformed value falls back to the
//! caller's default and is logged.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key-value store
pub trait KvStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Build a namespaced key, e.g. `arcade:catch:progress`
pub fn storage_key(prefix: &str, namespace: &str, name: &str) -> String {
    format!("{prefix}:{namespace}:{name}")
}

/// Read and decode a JSON value, substituting the default when the key is
/// absent, unreadable or malformed
pub fn load_json<T>(store: &dyn KvStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            log::info!("No saved value for {key}, using defaults");
            return T::default();
        }
        Err(err) => {
            log::warn!("Could not read {key}: {err}; using defaults");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => {
            log::info!("Loaded {key}");
            value
        }
        Err(err) => {
            log::warn!("Malformed value under {key}: {err}; using defaults");
            T::default()
        }
    }
}

pub fn save_json<T: Serialize>(store: &mut dyn KvStore, key: &str, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)?;
    log::debug!("Saved {key} ({} bytes)", json.len());
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
        name: String,
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("arcade", "snake", "progress"), "arcade:snake:progress");
    }

    #[test]
    fn test_json_roundtrip() {
        let mut store = MemoryStore::new();
        let value = Sample {
            count: 7,
            name: "x".into(),
        };
        save_json(&mut store, "k", &value).unwrap();
        assert_eq!(load_json::<Sample>(&store, "k"), value);
    }

    #[test]
    fn test_missing_key_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_json::<Sample>(&store, "nope"), Sample::default());
    }

    #[test]
    fn test_malformed_value_defaults() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert_eq!(load_json::<Sample>(&store, "k"), Sample::default());

        store.set("k", r#"{"count":"seven","name":"x"}"#).unwrap();
        assert_eq!(load_json::<Sample>(&store, "k"), Sample::default());
    }

    #[test]
    fn test_memory_remove() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.len(), 1);
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_broken_store_reports_error() {
        let mut store = testing::BrokenStore::default();
        let err = save_json(&mut store, "k", &Sample::default()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
