//! Ledger store trait and shared result types

use async_trait::async_trait;
use healchain_core::{HealchainResult, Record, StateWriter, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::composite::{create_composite_key, is_composite_key, MAX_UNICODE_RUNE};
use crate::query::Selector;

/// Key and value returned by scans and queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed write to a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: Timestamp,
    pub is_delete: bool,
    pub value: Vec<u8>,
}

/// Paging information for a rich query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub fetched_records_count: usize,
    /// Key of the last returned record; pass back to continue after it
    pub bookmark: String,
}

/// Ledger state store.
///
/// Backends provide an ordered scan and key history; range, composite-key
/// and selector queries are layered on top.
#[async_trait]
pub trait LedgerStore: StateWriter {
    /// Ordered scan over `[start, end)`, including composite keys.
    /// `None` leaves the end unbounded.
    async fn scan(&self, start: &str, end: Option<&str>) -> HealchainResult<Vec<KeyValue>>;

    /// Every committed write to `key`, oldest first
    async fn get_history_for_key(&self, key: &str) -> HealchainResult<Vec<KeyModification>>;

    /// Plain keys in `[start_key, end_key)`; an empty bound is open
    async fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> HealchainResult<Vec<KeyValue>> {
        let end = if end_key.is_empty() { None } else { Some(end_key) };
        let entries = self.scan(start_key, end).await?;
        Ok(entries
            .into_iter()
            .filter(|kv| !is_composite_key(&kv.key))
            .collect())
    }

    /// Composite keys whose leading components match
    async fn get_state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> HealchainResult<Vec<KeyValue>> {
        let prefix = create_composite_key(object_type, attributes)?;
        let end = format!("{}{}", prefix, MAX_UNICODE_RUNE);
        let entries = self.scan(&prefix, Some(end.as_str())).await?;
        Ok(entries
            .into_iter()
            .filter(|kv| kv.key.starts_with(&prefix))
            .collect())
    }

    /// Documents matching the selector, in key order
    async fn get_query_result(&self, selector: &Selector) -> HealchainResult<Vec<KeyValue>> {
        let (records, _) = self
            .get_query_result_with_pagination(selector, 0, "")
            .await?;
        Ok(records)
    }

    /// One page of documents after `bookmark`; a `page_size` of 0 means no limit
    async fn get_query_result_with_pagination(
        &self,
        selector: &Selector,
        page_size: usize,
        bookmark: &str,
    ) -> HealchainResult<(Vec<KeyValue>, QueryMetadata)> {
        debug!(query = %selector, page_size, bookmark, "Rich query");

        let entries = self.scan(bookmark, None).await?;
        let mut records = Vec::new();

        for kv in entries {
            if is_composite_key(&kv.key) || (!bookmark.is_empty() && kv.key == bookmark) {
                continue;
            }
            // only JSON documents are visible to selectors
            let Ok(document) = serde_json::from_slice::<serde_json::Value>(&kv.value) else {
                continue;
            };
            if selector.matches(&document) {
                records.push(kv);
                if page_size > 0 && records.len() == page_size {
                    break;
                }
            }
        }

        let metadata = QueryMetadata {
            fetched_records_count: records.len(),
            bookmark: records
                .last()
                .map(|kv| kv.key.clone())
                .unwrap_or_else(|| bookmark.to_string()),
        };

        Ok((records, metadata))
    }
}

/// Shared handle to any ledger store
pub type SharedLedgerStore = Arc<dyn LedgerStore>;

/// Read and decode a record, `None` when the key is absent
pub async fn read_record<R, S>(store: &S, key: &str) -> HealchainResult<Option<R>>
where
    R: Record,
    S: LedgerStore + ?Sized,
{
    match store.get_state(key).await? {
        Some(bytes) => Ok(Some(R::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Decode every value of a scan or query, preserving order
pub fn decode_records<R: Record>(entries: Vec<KeyValue>) -> HealchainResult<Vec<R>> {
    entries.iter().map(|kv| R::from_bytes(&kv.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedgerStore;
    use healchain_core::StateChange;
    use serde_json::json;

    async fn seeded_store() -> MemoryLedgerStore {
        let store = MemoryLedgerStore::new();
        let docs = [
            ("a1", json!({"docType": "asset", "owner": "tom", "size": 5})),
            ("a2", json!({"docType": "asset", "owner": "jerry", "size": 4})),
            ("a3", json!({"docType": "asset", "owner": "tom", "size": 6})),
            ("u1", json!({"docType": "user", "owner": "tom"})),
        ];
        let mut changes: Vec<StateChange> = docs
            .iter()
            .map(|(k, v)| StateChange::put(*k, serde_json::to_vec(v).unwrap()))
            .collect();
        changes.push(StateChange::put(
            create_composite_key("owner", &["tom", "a1"]).unwrap(),
            vec![0],
        ));
        changes.push(StateChange::put("raw", b"not json".to_vec()));
        store.apply_batch(changes).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_range_excludes_composite_keys() {
        let store = seeded_store().await;

        let all = store.get_state_by_range("", "").await.unwrap();
        let keys: Vec<_> = all.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "a2", "a3", "raw", "u1"]);

        let some = store.get_state_by_range("a2", "u1").await.unwrap();
        let keys: Vec<_> = some.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["a2", "a3", "raw"]);
    }

    #[tokio::test]
    async fn test_partial_composite_key() {
        let store = seeded_store().await;

        let hits = store
            .get_state_by_partial_composite_key("owner", &["tom"])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let none = store
            .get_state_by_partial_composite_key("owner", &["jerry"])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_rich_query() {
        let store = seeded_store().await;

        let selector = Selector::doc_type("asset").eq("owner", "tom");
        let hits = store.get_query_result(&selector).await.unwrap();
        let keys: Vec<_> = hits.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "a3"]);

        let empty = store
            .get_query_result(&Selector::doc_type("asset").eq("owner", "spike"))
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = seeded_store().await;
        let selector = Selector::doc_type("asset");

        let (page, meta) = store
            .get_query_result_with_pagination(&selector, 2, "")
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(meta.fetched_records_count, 2);
        assert_eq!(meta.bookmark, "a2");

        let (page, meta) = store
            .get_query_result_with_pagination(&selector, 2, &meta.bookmark)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].key, "a3");

        let (page, meta) = store
            .get_query_result_with_pagination(&selector, 2, &meta.bookmark)
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(meta.bookmark, "a3");
    }
}
