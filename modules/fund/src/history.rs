//! Key history for audit trails

use healchain_core::HealchainResult;
use healchain_state::{KeyModification, LedgerStore};
use serde::{Deserialize, Serialize};

use crate::ledger::FundLedger;

/// One committed write to a key, as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHistory {
    #[serde(rename = "txID")]
    pub tx_id: String,
    /// RFC 3339 commit time
    #[serde(rename = "txTimestamp")]
    pub tx_timestamp: String,
    #[serde(rename = "txIsDelete")]
    pub is_delete: bool,
    /// Raw record bytes, base64 on the wire
    #[serde(rename = "txValue", with = "base64_bytes")]
    pub value: Vec<u8>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

impl From<KeyModification> for TxHistory {
    fn from(modification: KeyModification) -> Self {
        Self {
            tx_id: modification.tx_id,
            tx_timestamp: modification.timestamp.to_rfc3339(),
            is_delete: modification.is_delete,
            value: modification.value,
        }
    }
}

impl<S: LedgerStore + ?Sized> FundLedger<S> {
    /// Every write to `key`, oldest first; empty if the key was never written
    pub async fn get_tx_history(&self, key: &str) -> HealchainResult<Vec<TxHistory>> {
        let history = self.store().get_history_for_key(key).await?;
        Ok(history.into_iter().map(TxHistory::from).collect())
    }
}
