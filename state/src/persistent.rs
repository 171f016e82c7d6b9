//! Persistent ledger store using sled database

use async_trait::async_trait;
use healchain_core::{
    HealchainError, HealchainResult, StateChange, StateReader, StateVersion, StateWriter,
    Timestamp,
};
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::memory::validate_key;
use crate::store::{KeyModification, KeyValue, LedgerStore};

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const HISTORY_TREE: &str = "history";
const VERSION_KEY: &[u8] = b"version";

fn store_err(e: impl std::fmt::Display) -> HealchainError {
    HealchainError::StoreFailure(e.to_string())
}

/// History entries for a key share this prefix; the suffix is the big-endian version
fn history_prefix(key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + key.len());
    prefix.extend_from_slice(&(key.len() as u32).to_be_bytes());
    prefix.extend_from_slice(key.as_bytes());
    prefix
}

fn history_key(key: &str, version: StateVersion) -> Vec<u8> {
    let mut history_key = history_prefix(key);
    history_key.extend_from_slice(&version.0.to_be_bytes());
    history_key
}

/// Persistent ledger store backed by sled database
pub struct PersistentLedgerStore {
    db: Db,
    state: Tree,
    meta: Tree,
    history: Tree,
    version: RwLock<StateVersion>,
}

impl PersistentLedgerStore {
    pub fn open<P: AsRef<Path>>(path: P) -> HealchainResult<Self> {
        let db = sled::open(path.as_ref()).map_err(store_err)?;

        let state = db.open_tree(STATE_TREE).map_err(store_err)?;
        let meta = db.open_tree(META_TREE).map_err(store_err)?;
        let history = db.open_tree(HISTORY_TREE).map_err(store_err)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(store_err)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    HealchainError::StoreFailure("malformed version entry".into())
                })?;
                StateVersion::new(u64::from_le_bytes(raw))
            }
            None => StateVersion::new(0),
        };

        info!(path = %path.as_ref().display(), %version, "Opened ledger store");

        Ok(Self {
            db,
            state,
            meta,
            history,
            version: RwLock::new(version),
        })
    }

    pub fn current_version(&self) -> StateVersion {
        *self.version.read()
    }

    pub fn read(&self, key: &str) -> HealchainResult<Option<Vec<u8>>> {
        self.state
            .get(key.as_bytes())
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(store_err)
    }

    pub fn write_batch(&self, changes: Vec<StateChange>) -> HealchainResult<StateVersion> {
        for change in &changes {
            validate_key(change.key())?;
        }

        let mut version = self.version.write();
        let new_version = version.next();
        let timestamp = Timestamp::now();
        let tx_id = new_version.tx_id();

        let mut batch = sled::Batch::default();
        let mut history = sled::Batch::default();

        for change in changes {
            let (key, modification) = match change {
                StateChange::Put { key, value } => {
                    batch.insert(key.as_bytes(), value.as_slice());
                    let modification = KeyModification {
                        tx_id: tx_id.clone(),
                        timestamp,
                        is_delete: false,
                        value,
                    };
                    (key, modification)
                }
                StateChange::Delete { key } => {
                    batch.remove(key.as_bytes());
                    let modification = KeyModification {
                        tx_id: tx_id.clone(),
                        timestamp,
                        is_delete: true,
                        value: Vec::new(),
                    };
                    (key, modification)
                }
            };
            let encoded = bincode::serialize(&modification).map_err(store_err)?;
            history.insert(history_key(&key, new_version), encoded);
        }

        // Apply state changes atomically
        self.state.apply_batch(batch).map_err(store_err)?;
        self.history.apply_batch(history).map_err(store_err)?;
        self.meta
            .insert(VERSION_KEY, new_version.0.to_le_bytes().to_vec())
            .map_err(store_err)?;

        self.db.flush().map_err(store_err)?;

        *version = new_version;
        debug!(version = %new_version, "Persisted batch");
        Ok(new_version)
    }

    pub fn scan_range(&self, start: &str, end: Option<&str>) -> HealchainResult<Vec<KeyValue>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let start = start.as_bytes().to_vec();
        let iter = match end {
            Some(end) => self.state.range(start..end.as_bytes().to_vec()),
            None => self.state.range(start..),
        };

        iter.map(|result| -> HealchainResult<KeyValue> {
            let (key, value) = result.map_err(store_err)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| HealchainError::StoreFailure(format!("non-UTF-8 key: {}", e)))?;
            Ok(KeyValue {
                key,
                value: value.to_vec(),
            })
        })
        .collect()
    }

    pub fn history_for(&self, key: &str) -> HealchainResult<Vec<KeyModification>> {
        self.history
            .scan_prefix(history_prefix(key))
            .map(|result| -> HealchainResult<KeyModification> {
                let (_, bytes) = result.map_err(store_err)?;
                bincode::deserialize(&bytes)
                    .map_err(|e| HealchainError::CorruptRecord(format!("history entry: {}", e)))
            })
            .collect()
    }

    /// Get database size estimate
    pub fn size_estimate(&self) -> usize {
        self.state.len()
    }
}

#[async_trait]
impl StateReader for PersistentLedgerStore {
    async fn version(&self) -> StateVersion {
        self.current_version()
    }

    async fn get_state(&self, key: &str) -> HealchainResult<Option<Vec<u8>>> {
        self.read(key)
    }
}

#[async_trait]
impl StateWriter for PersistentLedgerStore {
    async fn apply_batch(&self, changes: Vec<StateChange>) -> HealchainResult<StateVersion> {
        self.write_batch(changes)
    }
}

#[async_trait]
impl LedgerStore for PersistentLedgerStore {
    async fn scan(&self, start: &str, end: Option<&str>) -> HealchainResult<Vec<KeyValue>> {
        self.scan_range(start, end)
    }

    async fn get_history_for_key(&self, key: &str) -> HealchainResult<Vec<KeyModification>> {
        self.history_for(key)
    }
}

/// Thread-safe persistent store wrapper
pub type SharedPersistentLedgerStore = Arc<PersistentLedgerStore>;

/// Create a shared persistent ledger store
pub fn create_persistent_store<P: AsRef<Path>>(
    path: P,
) -> HealchainResult<SharedPersistentLedgerStore> {
    Ok(Arc::new(PersistentLedgerStore::open(path)?))
}
