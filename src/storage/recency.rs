use std::marker::PhantomData;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use super::db::Database;

/// Durable key and capacity of the search-term history list.
pub const SEARCH_HISTORY_KEY: &str = "searchHistory";
pub const SEARCH_HISTORY_CAPACITY: usize = 10;

/// Durable key and capacity of the watched-videos history list.
pub const WATCH_HISTORY_KEY: &str = "watchHistory";
pub const WATCH_HISTORY_CAPACITY: usize = 50;

/// Supplies the deduplication identity of a payload stored in a
/// [`BoundedRecencyStore`].
///
/// Search terms are their own key; watched videos are keyed by video id.
pub trait RecencyKey {
    fn recency_key(&self) -> &str;
}

impl RecencyKey for String {
    fn recency_key(&self) -> &str {
        self
    }
}

/// A capacity-bounded, deduplicated, most-recent-first list persisted as a
/// single JSON blob under one durable key.
///
/// Invariants, maintained by every operation:
/// - keys are unique across the list
/// - entries are ordered by strictly decreasing recency of last insert
/// - length never exceeds `capacity`; overflow drops the oldest entries
///
/// An absent or malformed persisted blob loads as an empty list. Each
/// mutation is a read-modify-write that replaces the whole blob in one
/// statement; there is no concurrent mutation in this application's
/// single-control-flow model.
pub struct BoundedRecencyStore<T> {
    db: Database,
    store_key: &'static str,
    capacity: usize,
    _payload: PhantomData<fn() -> T>,
}

impl<T> BoundedRecencyStore<T>
where
    T: Serialize + DeserializeOwned + RecencyKey,
{
    pub fn new(db: Database, store_key: &'static str, capacity: usize) -> Self {
        Self {
            db,
            store_key,
            capacity,
            _payload: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Load the persisted list, most-recent-first.
    ///
    /// A missing blob yields an empty list. A blob that no longer parses is
    /// logged and treated as empty rather than surfaced: a corrupted local
    /// history is not actionable by the user and must not take the rest of
    /// the application down with it.
    pub async fn load(&self) -> Result<Vec<T>> {
        let Some(blob) = self.db.get_value(self.store_key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&blob) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(
                    store = self.store_key,
                    error = %e,
                    "Persisted history blob is malformed, starting empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Insert `value` under `key` at the front of the list.
    ///
    /// Any existing entry with the same key is removed first, so a re-entered
    /// term or re-watched video moves to the front instead of duplicating.
    /// The list is then truncated to capacity and persisted in full.
    ///
    /// A whitespace-only `key` is rejected: the list and the persisted blob
    /// are left untouched.
    pub async fn insert(&self, key: &str, value: T) -> Result<Vec<T>> {
        if key.trim().is_empty() {
            return self.load().await;
        }

        let list = apply_insert(self.load().await?, key, value, self.capacity);
        self.persist(&list).await?;
        Ok(list)
    }

    /// Remove the entry with `key`, if present, and persist the result.
    ///
    /// Persists idempotently even when the key was absent.
    pub async fn remove(&self, key: &str) -> Result<Vec<T>> {
        let list = apply_remove(self.load().await?, key);
        self.persist(&list).await?;
        Ok(list)
    }

    /// Empty the list and delete the persisted row outright (not an
    /// empty-list blob).
    pub async fn clear(&self) -> Result<()> {
        self.db.delete_value(self.store_key).await
    }

    async fn persist(&self, list: &[T]) -> Result<()> {
        let blob = serde_json::to_string(list)?;
        self.db.set_value(self.store_key, &blob).await
    }
}

/// Pure form of the insert transform: dedup by key, prepend, truncate.
fn apply_insert<T: RecencyKey>(mut list: Vec<T>, key: &str, value: T, capacity: usize) -> Vec<T> {
    list.retain(|entry| entry.recency_key() != key);
    list.insert(0, value);
    list.truncate(capacity);
    list
}

/// Pure form of the remove transform.
fn apply_remove<T: RecencyKey>(mut list: Vec<T>, key: &str) -> Vec<T> {
    list.retain(|entry| entry.recency_key() != key);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_prepends() {
        let list = apply_insert(strings(&["dogs"]), "cats", "cats".to_string(), 10);
        assert_eq!(list, strings(&["cats", "dogs"]));
    }

    #[test]
    fn test_insert_moves_duplicate_to_front() {
        let list = strings(&["cats", "dogs"]);
        let list = apply_insert(list, "dogs", "dogs".to_string(), 10);
        assert_eq!(list, strings(&["dogs", "cats"]));
    }

    #[test]
    fn test_insert_enforces_capacity() {
        let mut list = Vec::new();
        for i in 0..12 {
            list = apply_insert(list, &format!("k{}", i), format!("k{}", i), 10);
        }
        assert_eq!(list.len(), 10);
        // Most recent first, oldest two dropped
        assert_eq!(list[0], "k11");
        assert_eq!(list[9], "k2");
    }

    #[test]
    fn test_remove_filters_key() {
        let list = apply_remove(strings(&["a", "b", "c"]), "b");
        assert_eq!(list, strings(&["a", "c"]));
    }

    #[test]
    fn test_remove_absent_key_is_identity() {
        let list = apply_remove(strings(&["a", "b"]), "z");
        assert_eq!(list, strings(&["a", "b"]));
    }

    proptest! {
        /// After any sequence of inserts, keys are unique, length stays
        /// within capacity, and the most recent insert is at index 0.
        #[test]
        fn prop_insert_invariants(keys in prop::collection::vec("[a-e]", 1..40)) {
            const CAP: usize = 4;
            let mut list: Vec<String> = Vec::new();
            for key in &keys {
                list = apply_insert(list, key, key.clone(), CAP);

                prop_assert!(list.len() <= CAP);
                prop_assert_eq!(&list[0], key);
                let mut seen = std::collections::HashSet::new();
                for entry in &list {
                    prop_assert!(seen.insert(entry.clone()), "duplicate key {}", entry);
                }
            }
        }

        /// The list always contains exactly the most recently inserted
        /// distinct keys, in reverse insertion order.
        #[test]
        fn prop_recency_order_matches_model(keys in prop::collection::vec("[a-h]", 1..60)) {
            const CAP: usize = 5;
            let mut list: Vec<String> = Vec::new();
            for key in &keys {
                list = apply_insert(list, key, key.clone(), CAP);
            }

            // Reference model: walk the inserts backwards, keeping first sight
            let mut expected: Vec<String> = Vec::new();
            for key in keys.iter().rev() {
                if !expected.contains(key) {
                    expected.push(key.clone());
                }
                if expected.len() == CAP {
                    break;
                }
            }

            prop_assert_eq!(list, expected);
        }
    }

    // ------------------------------------------------------------------
    // Persistence-layer behavior
    // ------------------------------------------------------------------

    async fn test_store() -> BoundedRecencyStore<String> {
        let db = Database::open(":memory:").await.unwrap();
        BoundedRecencyStore::new(db, SEARCH_HISTORY_KEY, SEARCH_HISTORY_CAPACITY)
    }

    #[tokio::test]
    async fn test_load_absent_blob_is_empty() {
        let store = test_store().await;
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_blob_is_empty() {
        let store = test_store().await;
        store
            .db
            .set_value(SEARCH_HISTORY_KEY, "{ definitely not a JSON array")
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_blob_is_empty() {
        let store = test_store().await;
        // Valid JSON, wrong shape
        store
            .db
            .set_value(SEARCH_HISTORY_KEY, r#"{"cats": 1}"#)
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_persisting() {
        let store = test_store().await;
        store.insert("cats", "cats".to_string()).await.unwrap();

        let unchanged = store.insert("", "empty".to_string()).await.unwrap();
        assert_eq!(unchanged, vec!["cats".to_string()]);
        let unchanged = store.insert("   ", "blank".to_string()).await.unwrap();
        assert_eq!(unchanged, vec!["cats".to_string()]);

        // Blob on disk still holds only the original entry
        let blob = store.db.get_value(SEARCH_HISTORY_KEY).await.unwrap();
        assert_eq!(blob.as_deref(), Some(r#"["cats"]"#));
    }

    #[tokio::test]
    async fn test_clear_deletes_row() {
        let store = test_store().await;
        store.insert("cats", "cats".to_string()).await.unwrap();
        store.clear().await.unwrap();

        // The row is gone, not replaced with an empty-list blob
        assert_eq!(store.db.get_value(SEARCH_HISTORY_KEY).await.unwrap(), None);
        assert!(store.load().await.unwrap().is_empty());
    }
}
