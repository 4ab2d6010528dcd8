//! In-memory store (DashMap) with simulated quota and availability.

use super::KeyValueStore;
use crate::error::StorageError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

fn entry_bytes(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Volatile [`KeyValueStore`] for tests and embedding.
///
/// Quota accounting counts key plus value bytes, like a browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    /// Key + value bytes held. The lock also serializes writers so the quota
    /// check and the write happen together.
    used_bytes: Mutex<u64>,
    quota_bytes: Option<u64>,
    disabled: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once key + value bytes would exceed `limit`.
    pub fn with_quota(limit: u64) -> Self {
        Self {
            quota_bytes: Some(limit),
            ..Self::default()
        }
    }

    /// Toggles availability. While unavailable every operation fails.
    pub fn set_available(&self, available: bool) {
        self.disabled.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store is disabled".into()));
        }
        Ok(())
    }

    /// Key + value bytes currently stored.
    pub fn used_bytes(&self) -> u64 {
        *self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut used = self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = self
            .entries
            .get(key)
            .map(|v| entry_bytes(key, v.value()))
            .unwrap_or(0);
        let needed = used.saturating_sub(replaced) + entry_bytes(key, value);
        if let Some(limit) = self.quota_bytes {
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        *used = needed;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut used = self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((k, v)) = self.entries.remove(key) {
            *used = used.saturating_sub(entry_bytes(&k, &v));
        }
        Ok(())
    }
}
