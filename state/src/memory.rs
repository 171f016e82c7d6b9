//! In-memory ledger store for testing and the dev host

use async_trait::async_trait;
use dashmap::DashMap;
use healchain_core::{
    HealchainError, HealchainResult, StateChange, StateReader, StateVersion, StateWriter,
    Timestamp,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::debug;

use crate::store::{KeyModification, KeyValue, LedgerStore};

/// In-memory ledger store
pub struct MemoryLedgerStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    version: RwLock<StateVersion>,
    history: DashMap<String, Vec<KeyModification>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            version: RwLock::new(StateVersion::new(0)),
            history: DashMap::new(),
        }
    }

    /// Number of live keys, composite index entries included
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_key(key: &str) -> HealchainResult<()> {
    if key.is_empty() {
        return Err(HealchainError::InvalidKey("empty key".into()));
    }
    Ok(())
}

#[async_trait]
impl StateReader for MemoryLedgerStore {
    async fn version(&self) -> StateVersion {
        *self.version.read()
    }

    async fn get_state(&self, key: &str) -> HealchainResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }
}

#[async_trait]
impl StateWriter for MemoryLedgerStore {
    async fn apply_batch(&self, changes: Vec<StateChange>) -> HealchainResult<StateVersion> {
        for change in &changes {
            validate_key(change.key())?;
        }

        let mut version = self.version.write();
        let mut data = self.data.write();
        let new_version = version.next();
        let timestamp = Timestamp::now();
        let tx_id = new_version.tx_id();

        for change in changes {
            let (key, modification) = match change {
                StateChange::Put { key, value } => {
                    data.insert(key.clone(), value.clone());
                    (
                        key,
                        KeyModification {
                            tx_id: tx_id.clone(),
                            timestamp,
                            is_delete: false,
                            value,
                        },
                    )
                }
                StateChange::Delete { key } => {
                    data.remove(&key);
                    (
                        key,
                        KeyModification {
                            tx_id: tx_id.clone(),
                            timestamp,
                            is_delete: true,
                            value: Vec::new(),
                        },
                    )
                }
            };
            self.history.entry(key).or_default().push(modification);
        }

        *version = new_version;
        debug!(version = %new_version, "Applied batch");
        Ok(new_version)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn scan(&self, start: &str, end: Option<&str>) -> HealchainResult<Vec<KeyValue>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let data = self.data.read();
        Ok(data
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn get_history_for_key(&self, key: &str) -> HealchainResult<Vec<KeyModification>> {
        Ok(self
            .history
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// Thread-safe memory store wrapper
pub type SharedMemoryLedgerStore = Arc<MemoryLedgerStore>;

/// Create a shared memory ledger store
pub fn create_memory_store() -> SharedMemoryLedgerStore {
    Arc::new(MemoryLedgerStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryLedgerStore::new();

        store.put_state("key1", b"value1").await.unwrap();
        let value = store.get_state("key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));
        assert!(store.exists("key1").await.unwrap());

        store.delete_state("key1").await.unwrap();
        assert_eq!(store.get_state("key1").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_batch() {
        let store = MemoryLedgerStore::new();

        let changes = vec![
            StateChange::put("k1", b"v1".to_vec()),
            StateChange::put("k2", b"v2".to_vec()),
        ];

        let version = store.apply_batch(changes).await.unwrap();
        assert_eq!(version.0, 1);
        assert_eq!(store.version().await, version);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = MemoryLedgerStore::new();
        let changes = vec![
            StateChange::put("ok", b"v".to_vec()),
            StateChange::put("", b"v".to_vec()),
        ];
        let result = store.apply_batch(changes).await;
        assert!(matches!(result, Err(HealchainError::InvalidKey(_))));
        // nothing from the rejected batch is visible
        assert!(store.get_state("ok").await.unwrap().is_none());
        assert_eq!(store.version().await.0, 0);
    }

    #[tokio::test]
    async fn test_history_for_key() {
        let store = MemoryLedgerStore::new();

        store.put_state("k", b"one").await.unwrap();
        store.put_state("other", b"x").await.unwrap();
        store.put_state("k", b"two").await.unwrap();
        store.delete_state("k").await.unwrap();

        let history = store.get_history_for_key("k").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].value, b"one".to_vec());
        assert_eq!(history[0].tx_id, StateVersion::new(1).tx_id());
        assert_eq!(history[1].value, b"two".to_vec());
        assert!(history[2].is_delete);

        assert!(store.get_history_for_key("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_bounds() {
        let store = MemoryLedgerStore::new();
        for key in ["a", "b", "c"] {
            store.put_state(key, key.as_bytes()).await.unwrap();
        }

        let keys = |entries: Vec<KeyValue>| -> Vec<String> {
            entries.into_iter().map(|kv| kv.key).collect()
        };

        assert_eq!(keys(store.scan("b", None).await.unwrap()), vec!["b", "c"]);
        assert_eq!(keys(store.scan("a", Some("c")).await.unwrap()), vec!["a", "b"]);
        assert!(store.scan("c", Some("a")).await.unwrap().is_empty());
    }
}
