//! Sled-backed store: one tree per application namespace.

use super::{KeyValueStore, DEFAULT_NAMESPACE};
use crate::error::StorageError;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const DEFAULT_PATH: &str = "./data/fitroom";

fn entry_bytes(key: &[u8], value: &[u8]) -> u64 {
    (key.len() + value.len()) as u64
}

/// Durable [`KeyValueStore`] on a sled database.
///
/// All keys live in the tree named after the namespace, so two namespaces can
/// share one database without seeing each other's values.
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    /// Key + value bytes in the tree, counted once at open and kept current by
    /// writes. Writers hold the lock across the quota check and the write.
    used_bytes: Mutex<u64>,
    quota_bytes: Option<u64>,
    flush_on_write: bool,
}

impl SledStore {
    /// Opens or creates the store at `./data/fitroom` under the default namespace.
    pub fn new() -> Result<Self, StorageError> {
        Self::open_path(DEFAULT_PATH, DEFAULT_NAMESPACE)
    }

    /// Opens or creates the store at `path`, using the tree for `namespace`.
    pub fn open_path<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        let tree = db.open_tree(namespace)?;
        let used = Self::scan_used_bytes(&tree)?;
        tracing::debug!(target: "fitroom::storage", namespace, used_bytes = used, "sled tree opened");
        Ok(Self {
            db,
            tree,
            used_bytes: Mutex::new(used),
            quota_bytes: None,
            flush_on_write: true,
        })
    }

    /// Limits the namespace to `limit` bytes of keys plus values.
    pub fn with_quota(mut self, limit: Option<u64>) -> Self {
        self.quota_bytes = limit;
        self
    }

    /// When false, writes reach disk on sled's background flush instead of per call.
    pub fn with_flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }

    /// Flushes dirty buffers to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// Key + value bytes currently stored in this namespace.
    pub fn used_bytes(&self) -> u64 {
        *self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scan_used_bytes(tree: &sled::Tree) -> Result<u64, StorageError> {
        let mut total = 0;
        for entry in tree.iter() {
            let (k, v) = entry?;
            total += entry_bytes(&k, &v);
        }
        Ok(total)
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(raw) = self.tree.get(key.as_bytes())? else {
            return Ok(None);
        };
        match String::from_utf8(raw.to_vec()) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!(target: "fitroom::storage", key = key, error = %e, "stored value is not UTF-8");
                Err(e.into())
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut used = self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = self
            .tree
            .get(key.as_bytes())?
            .map(|v| entry_bytes(key.as_bytes(), &v))
            .unwrap_or(0);
        let needed = used.saturating_sub(replaced) + entry_bytes(key.as_bytes(), value.as_bytes());
        if let Some(limit) = self.quota_bytes {
            if needed > limit {
                tracing::warn!(
                    target: "fitroom::storage",
                    key = key,
                    needed,
                    limit,
                    "write rejected: quota exceeded"
                );
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        let prev = self.tree.insert(key.as_bytes(), value.as_bytes())?;
        *used = needed;
        if self.flush_on_write {
            self.tree.flush()?;
        }

        let is_update = prev.is_some();
        tracing::debug!(
            target: "fitroom::storage",
            key = key,
            bytes = value.len(),
            action = if is_update { "UPDATE" } else { "INSERT" },
            "{} key '{}' ({} bytes)",
            if is_update { "updated" } else { "inserted" },
            key,
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut used = self.used_bytes.lock().unwrap_or_else(PoisonError::into_inner);
        let prev = self.tree.remove(key.as_bytes())?;
        if let Some(v) = prev {
            *used = used.saturating_sub(entry_bytes(key.as_bytes(), &v));
            if self.flush_on_write {
                self.tree.flush()?;
            }
            tracing::debug!(target: "fitroom::storage", key = key, action = "REMOVE", "removed key '{}'", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");
        let a = SledStore::open_path(&db_path, "a").unwrap();
        a.set("shared", "from-a").unwrap();
        drop(a);

        let b = SledStore::open_path(&db_path, "b").unwrap();
        assert_eq!(b.get("shared").unwrap(), None);
        b.remove("shared").unwrap();
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open_path(dir.path(), "q").unwrap().with_quota(Some(10));
        store.set("k", "short").unwrap();
        let err = store.set("k2", "0123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(store.get("k2").unwrap(), None);
    }

    #[test]
    fn usage_survives_reopen_and_shrinks_on_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let store = SledStore::open_path(&path, "q").unwrap();
            store.set("a", "12345").unwrap();
            store.set("b", "1234").unwrap();
            assert_eq!(store.used_bytes(), 11);
        }

        let store = SledStore::open_path(&path, "q").unwrap().with_quota(Some(16));
        assert_eq!(store.used_bytes(), 11);
        let err = store.set("c", "123456").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 18, limit: 16 }));

        // Replacing "a" only counts the new value.
        store.set("a", "1234567890").unwrap();
        assert_eq!(store.used_bytes(), 16);

        store.remove("a").unwrap();
        assert_eq!(store.used_bytes(), 5);
        store.set("c", "123456").unwrap();
        assert_eq!(store.used_bytes(), 12);
    }

    #[test]
    fn non_utf8_value_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open_path(dir.path(), "raw").unwrap();
        store.tree.insert("bad", &[0xff, 0xfe, 0x00][..]).unwrap();
        assert!(matches!(store.get("bad"), Err(StorageError::InvalidUtf8(_))));
    }
}
