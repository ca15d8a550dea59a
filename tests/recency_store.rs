//! Integration tests for the bounded recency stores: the search-history and
//! watch-history lists as they behave against a real (in-memory) local
//! store, including persistence across store instances and corrupt blobs.

use pretty_assertions::assert_eq;

use streamix::catalog::VideoSummary;
use streamix::storage::{
    BoundedRecencyStore, Database, SEARCH_HISTORY_CAPACITY, SEARCH_HISTORY_KEY,
    WATCH_HISTORY_CAPACITY, WATCH_HISTORY_KEY,
};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn search_store(db: &Database) -> BoundedRecencyStore<String> {
    BoundedRecencyStore::new(db.clone(), SEARCH_HISTORY_KEY, SEARCH_HISTORY_CAPACITY)
}

fn watch_store(db: &Database) -> BoundedRecencyStore<VideoSummary> {
    BoundedRecencyStore::new(db.clone(), WATCH_HISTORY_KEY, WATCH_HISTORY_CAPACITY)
}

fn video(id: &str) -> VideoSummary {
    VideoSummary {
        id: id.to_string(),
        title: format!("Video {}", id),
        channel_title: "Test Channel".to_string(),
        thumbnail_url: format!("https://img.example/{}.jpg", id),
        published_at: "2024-05-01T09:30:00Z".parse().unwrap(),
    }
}

async fn insert_term(store: &BoundedRecencyStore<String>, term: &str) -> Vec<String> {
    store.insert(term, term.to_string()).await.unwrap()
}

// ============================================================================
// Search History
// ============================================================================

#[tokio::test]
async fn reinserted_term_moves_to_front_without_duplicating() {
    let db = test_db().await;
    let store = search_store(&db);

    insert_term(&store, "cats").await;
    insert_term(&store, "dogs").await;
    let list = insert_term(&store, "cats").await;

    assert_eq!(list, vec!["cats".to_string(), "dogs".to_string()]);
}

#[tokio::test]
async fn capacity_drops_oldest_first() {
    let db = test_db().await;
    let store = search_store(&db);

    let mut list = Vec::new();
    for i in 0..12 {
        list = insert_term(&store, &format!("term{}", i)).await;
    }

    assert_eq!(list.len(), SEARCH_HISTORY_CAPACITY);
    assert_eq!(list[0], "term11");
    assert_eq!(list[9], "term2");
    assert!(!list.contains(&"term0".to_string()));
    assert!(!list.contains(&"term1".to_string()));
}

#[tokio::test]
async fn recency_ordering_follows_last_insert() {
    let db = test_db().await;
    let store = search_store(&db);

    insert_term(&store, "alpha").await;
    insert_term(&store, "beta").await;
    insert_term(&store, "gamma").await;
    let list = insert_term(&store, "alpha").await;

    assert_eq!(
        list,
        vec!["alpha".to_string(), "gamma".to_string(), "beta".to_string()]
    );
}

#[tokio::test]
async fn whitespace_only_keys_are_rejected() {
    let db = test_db().await;
    let store = search_store(&db);

    insert_term(&store, "cats").await;
    let after_empty = store.insert("", "".to_string()).await.unwrap();
    let after_blank = store.insert("   ", "   ".to_string()).await.unwrap();

    assert_eq!(after_empty, vec!["cats".to_string()]);
    assert_eq!(after_blank, vec!["cats".to_string()]);
    assert_eq!(store.load().await.unwrap(), vec!["cats".to_string()]);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let db = test_db().await;
    let store = search_store(&db);

    insert_term(&store, "cats").await;
    insert_term(&store, "dogs").await;

    let list = store.remove("cats").await.unwrap();
    assert_eq!(list, vec!["dogs".to_string()]);

    // Removing an absent key changes nothing
    let list = store.remove("cats").await.unwrap();
    assert_eq!(list, vec!["dogs".to_string()]);
}

#[tokio::test]
async fn clear_empties_and_survives_reload() {
    let db = test_db().await;
    let store = search_store(&db);

    insert_term(&store, "cats").await;
    store.clear().await.unwrap();

    assert!(store.load().await.unwrap().is_empty());
    // A fresh store instance over the same database sees the same emptiness
    assert!(search_store(&db).load().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_persists_across_store_instances() {
    let db = test_db().await;

    {
        let store = search_store(&db);
        insert_term(&store, "cats").await;
        insert_term(&store, "dogs").await;
    }

    let reopened = search_store(&db);
    assert_eq!(
        reopened.load().await.unwrap(),
        vec!["dogs".to_string(), "cats".to_string()]
    );
}

#[tokio::test]
async fn corrupt_blob_loads_empty_and_recovers() {
    let db = test_db().await;
    db.set_value(SEARCH_HISTORY_KEY, "]]] not json [[[")
        .await
        .unwrap();

    let store = search_store(&db);
    assert!(store.load().await.unwrap().is_empty());

    // The store keeps working after the corruption
    let list = insert_term(&store, "recovered").await;
    assert_eq!(list, vec!["recovered".to_string()]);
    assert_eq!(
        store.load().await.unwrap(),
        vec!["recovered".to_string()]
    );
}

// ============================================================================
// Watch History
// ============================================================================

#[tokio::test]
async fn watch_history_roundtrips_full_payload() {
    let db = test_db().await;
    let store = watch_store(&db);

    let v = video("abc123");
    store.insert(&v.id.clone(), v.clone()).await.unwrap();

    let reopened = watch_store(&db);
    let list = reopened.load().await.unwrap();
    assert_eq!(list, vec![v]);
}

#[tokio::test]
async fn rewatched_video_moves_to_front() {
    let db = test_db().await;
    let store = watch_store(&db);

    for id in ["v1", "v2", "v3"] {
        let v = video(id);
        store.insert(id, v).await.unwrap();
    }
    let list = store.insert("v1", video("v1")).await.unwrap();

    let ids: Vec<&str> = list.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v3", "v2"]);
}

#[tokio::test]
async fn watch_history_capacity_is_fifty() {
    let db = test_db().await;
    let store = watch_store(&db);

    let mut list = Vec::new();
    for i in 0..55 {
        let id = format!("v{}", i);
        list = store.insert(&id, video(&id)).await.unwrap();
    }

    assert_eq!(list.len(), WATCH_HISTORY_CAPACITY);
    assert_eq!(list[0].id, "v54");
    assert_eq!(list[49].id, "v5");
}

#[tokio::test]
async fn remove_single_watched_video() {
    let db = test_db().await;
    let store = watch_store(&db);

    for id in ["v1", "v2", "v3"] {
        store.insert(id, video(id)).await.unwrap();
    }
    let list = store.remove("v2").await.unwrap();

    let ids: Vec<&str> = list.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v3", "v1"]);
}

// ============================================================================
// Store Independence
// ============================================================================

#[tokio::test]
async fn search_and_watch_stores_do_not_interfere() {
    let db = test_db().await;
    let searches = search_store(&db);
    let watches = watch_store(&db);

    insert_term(&searches, "cats").await;
    watches.insert("v1", video("v1")).await.unwrap();

    assert_eq!(searches.load().await.unwrap(), vec!["cats".to_string()]);
    assert_eq!(watches.load().await.unwrap().len(), 1);

    // Clearing one store leaves the other alone
    searches.clear().await.unwrap();
    assert!(searches.load().await.unwrap().is_empty());
    assert_eq!(watches.load().await.unwrap().len(), 1);
}
