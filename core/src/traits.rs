//! Core traits defining HEALCHAIN interfaces
//!
//! These traits define the contracts between the state store and the record handlers.

use crate::error::HealchainError;
use crate::types::StateVersion;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Result type for HEALCHAIN operations
pub type HealchainResult<T> = Result<T, HealchainError>;

/// A document stored in the ledger under its own key.
///
/// Encoding is JSON so that rich queries can select on document fields.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Value of the `docType` field for this record kind
    const DOC_TYPE: &'static str;

    /// State key the record is stored under
    fn key(&self) -> &str;

    /// `docType` carried by this instance
    fn doc_type(&self) -> &str;

    fn to_bytes(&self) -> HealchainResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            HealchainError::MarshalFailure(format!("{} {}: {}", Self::DOC_TYPE, self.key(), e))
        })
    }

    fn from_bytes(bytes: &[u8]) -> HealchainResult<Self> {
        let record: Self = serde_json::from_slice(bytes)
            .map_err(|e| HealchainError::CorruptRecord(format!("{}: {}", Self::DOC_TYPE, e)))?;
        if record.doc_type() != Self::DOC_TYPE {
            return Err(HealchainError::CorruptRecord(format!(
                "expected docType {}, found {}",
                Self::DOC_TYPE,
                record.doc_type()
            )));
        }
        Ok(record)
    }
}

/// State read access
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Get the current state version
    async fn version(&self) -> StateVersion;

    /// Get a value by key
    async fn get_state(&self, key: &str) -> HealchainResult<Option<Vec<u8>>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> HealchainResult<bool> {
        Ok(self.get_state(key).await?.is_some())
    }
}

/// State write access
#[async_trait]
pub trait StateWriter: StateReader {
    /// Apply a batch of changes atomically, returning the new version
    async fn apply_batch(&self, changes: Vec<StateChange>) -> HealchainResult<StateVersion>;

    /// Set a single value
    async fn put_state(&self, key: &str, value: &[u8]) -> HealchainResult<()> {
        self.apply_batch(vec![StateChange::put(key, value.to_vec())])
            .await
            .map(|_| ())
    }

    /// Delete a single key
    async fn delete_state(&self, key: &str) -> HealchainResult<()> {
        self.apply_batch(vec![StateChange::Delete { key: key.to_string() }])
            .await
            .map(|_| ())
    }
}

/// State change operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl StateChange {
    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        StateChange::Put {
            key: key.into(),
            value,
        }
    }

    /// Stage a record for writing under its own key
    pub fn record<R: Record>(record: &R) -> HealchainResult<Self> {
        Ok(StateChange::put(record.key(), record.to_bytes()?))
    }

    pub fn key(&self) -> &str {
        match self {
            StateChange::Put { key, .. } => key,
            StateChange::Delete { key } => key,
        }
    }
}
