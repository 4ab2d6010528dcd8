//! Key-value persistence adapter.
//!
//! Every persisted value is a string; structured values are JSON-encoded by the
//! caller through [`load_json`] / [`store_json`]. Keys are written independently:
//! there is no multi-key transaction.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default application namespace, shared by every persisted key.
pub const DEFAULT_NAMESPACE: &str = "avatarApp";

/// String-keyed persistent store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value at `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// The persisted keys for one application namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub avatar_image: String,
    pub measurements: String,
    pub accessories: String,
    pub clothing: String,
}

impl StorageKeys {
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            avatar_image: format!("{}_avatarImage", namespace),
            measurements: format!("{}_measurements", namespace),
            accessories: format!("{}_accessories", namespace),
            clothing: format!("{}_clothing", namespace),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::for_namespace(DEFAULT_NAMESPACE)
    }
}

/// Reads and decodes the JSON value at `key`.
///
/// Returns `Ok(None)` when the key is absent and `Err(StorageError::Encoding)` when
/// the stored text is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and writes it at `key`.
pub fn store_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_namespace() {
        let keys = StorageKeys::default();
        assert_eq!(keys.accessories, "avatarApp_accessories");
        assert_eq!(keys.clothing, "avatarApp_clothing");

        let other = StorageKeys::for_namespace("demo");
        assert_eq!(other.avatar_image, "demo_avatarImage");
        assert_eq!(other.measurements, "demo_measurements");
    }

    #[test]
    fn json_helpers_report_corrupt_values() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let res: Result<Option<Vec<String>>, _> = load_json(&store, "broken");
        assert!(matches!(res, Err(StorageError::Encoding(_))));

        let missing: Option<Vec<String>> = load_json(&store, "missing").unwrap();
        assert!(missing.is_none());

        store_json(&store, "list", &vec!["a", "b"]).unwrap();
        let back: Option<Vec<String>> = load_json(&store, "list").unwrap();
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
