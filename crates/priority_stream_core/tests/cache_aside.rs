mod common;

use common::{hours_before_t0, item, message, t0, CountingCache, MemoryItemStore};
use priority_stream_core::service::{item_key, stream_key};
use priority_stream_core::{
    CacheSettings, Priority, StreamError, StreamFilter, StreamPage, StreamRequest, StreamService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn settings() -> CacheSettings {
    CacheSettings {
        stream_ttl: Duration::from_secs(120),
        item_ttl: Duration::from_secs(300),
    }
}

fn store() -> MemoryItemStore {
    MemoryItemStore::new()
        .with_item("user-1", item("item-1", t0(), Priority::High, true))
        .with_item("user-1", item("item-2", hours_before_t0(1), Priority::Medium, false))
        .with_item("user-1", item("item-3", hours_before_t0(2), Priority::Low, true))
        .with_messages("item-1", vec![message("msg-1", t0(), "text")])
}

fn service(store: &Arc<MemoryItemStore>, cache: &Arc<CountingCache>) -> StreamService {
    StreamService::new(store.clone(), cache.clone(), settings())
}

#[tokio::test]
async fn populated_cache_short_circuits_the_store() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let cached = StreamPage {
        data: vec![item("cached-item", t0(), Priority::Low, false)],
        next_cursor: None,
    };
    cache.insert_raw(
        &stream_key("user-1", StreamFilter::All, 20, None),
        &serde_json::to_string(&cached).unwrap(),
    );

    let page = service(&store, &cache)
        .get_stream(&StreamRequest::new("user-1"))
        .await
        .unwrap();

    assert_eq!(page, cached);
    assert_eq!(store.total_calls(), 0);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn miss_computes_and_writes_back_with_stream_ttl() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);
    let request = StreamRequest::new("user-1").with_limit(2);

    let first = svc.get_stream(&request).await.unwrap();
    assert_eq!(first.data.len(), 2);
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 1);

    let (_, ttl) = cache
        .entry(&stream_key("user-1", StreamFilter::All, 2, None))
        .expect("page should be cached");
    assert_eq!(ttl, Duration::from_secs(120));

    let second = svc.get_stream(&request).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_page_cursor_continues_the_walk() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    let first = svc
        .get_stream(&StreamRequest::new("user-1").with_limit(2))
        .await
        .unwrap();
    let cached_first = svc
        .get_stream(&StreamRequest::new("user-1").with_limit(2))
        .await
        .unwrap();
    let cursor = cached_first.next_cursor.clone().unwrap();
    assert_eq!(Some(cursor.clone()), first.next_cursor);

    let second = svc
        .get_stream(&StreamRequest::new("user-1").with_limit(2).with_cursor(cursor))
        .await
        .unwrap();
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].id, "item-3");
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn filters_are_cached_separately() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    svc.get_stream(&StreamRequest::new("user-1")).await.unwrap();
    let unread = svc
        .get_stream(&StreamRequest::new("user-1").with_filter(StreamFilter::Unread))
        .await
        .unwrap();

    assert!(unread.data.iter().all(|i| i.is_unread));
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn cache_outage_degrades_to_always_compute() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    cache.fail();
    let svc = service(&store, &cache);

    let page = svc.get_stream(&StreamRequest::new("user-1")).await.unwrap();
    assert_eq!(page.data.len(), 3);
    let detail = svc.get_stream_item("user-1", "item-1").await.unwrap();
    assert!(detail.is_some());

    svc.get_stream(&StreamRequest::new("user-1")).await.unwrap();
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn undecodable_cache_entry_is_treated_as_a_miss() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let key = stream_key("user-1", StreamFilter::All, 20, None);
    cache.insert_raw(&key, "{ not json");

    let page = service(&store, &cache)
        .get_stream(&StreamRequest::new("user-1"))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 3);
    let (raw, _) = cache.entry(&key).unwrap();
    assert_eq!(serde_json::from_str::<StreamPage>(&raw).unwrap(), page);
}

#[tokio::test]
async fn invalid_cursor_fails_before_any_io() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());

    let err = service(&store, &cache)
        .get_stream(&StreamRequest::new("user-1").with_cursor("***"))
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::InvalidCursor(_)));
    assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn storage_errors_are_not_cached() {
    let store = Arc::new(store());
    store.fail();
    let cache = Arc::new(CountingCache::new());

    let err = service(&store, &cache)
        .get_stream(&StreamRequest::new("user-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Storage(_)));
    assert_eq!(cache.len(), 0);
}

#[tokio::test]
async fn detail_is_cached_per_user_with_item_ttl() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    let detail = svc.get_stream_item("user-1", "item-1").await.unwrap().unwrap();
    assert_eq!(detail.messages.len(), 1);

    let (_, ttl) = cache.entry(&item_key("user-1", "item-1")).unwrap();
    assert_eq!(ttl, Duration::from_secs(300));

    let again = svc.get_stream_item("user-1", "item-1").await.unwrap().unwrap();
    assert_eq!(again, detail);
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 1);

    // The cached copy is not served to a different user.
    let other = svc.get_stream_item("user-2", "item-1").await.unwrap();
    assert!(other.is_none());
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn absent_detail_is_not_cached() {
    let store = Arc::new(store());
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    assert!(svc.get_stream_item("user-1", "nonexistent").await.unwrap().is_none());
    assert!(svc.get_stream_item("user-1", "nonexistent").await.unwrap().is_none());

    assert_eq!(cache.len(), 0);
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_misses_may_both_compute() {
    let store = Arc::new(store().with_delay(Duration::from_millis(20)));
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);
    let request = StreamRequest::new("user-1");

    let (a, b) = futures::join!(svc.get_stream(&request), svc.get_stream(&request));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn dropping_the_request_abandons_the_store_call() {
    let store = Arc::new(store().with_delay(Duration::from_millis(200)));
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        svc.get_stream(&StreamRequest::new("user-1")),
    )
    .await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.completed_queries.load(Ordering::SeqCst), 0);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn colon_in_ids_cannot_reach_another_users_cached_detail() {
    let store = Arc::new(
        MemoryItemStore::new().with_item("a", item("b:c", t0(), Priority::High, true)),
    );
    let cache = Arc::new(CountingCache::new());
    let svc = service(&store, &cache);

    let owned = svc.get_stream_item("a", "b:c").await.unwrap();
    assert_eq!(owned.map(|i| i.id), Some("b:c".to_string()));

    let other = svc.get_stream_item("a:b", "c").await.unwrap();
    assert!(other.is_none());
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
}
