//! Full-stack cache flows against an in-memory store with real keyspace
//! semantics: population, tagged invalidation, TTL expiry, and the
//! documented bookkeeping races.

use common_redis::{Client, InMemoryRedisClient};
use common_tagcache::{derive_key, CacheKey, CacheSource, TagCache, TagName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct JobListing {
    id: i64,
    title: String,
}

fn setup() -> (TagCache, InMemoryRedisClient) {
    let store = InMemoryRedisClient::new();
    (TagCache::new(Arc::new(store.clone())), store)
}

#[tokio::test]
async fn test_miss_populates_and_tag_invalidation_evicts() {
    let (cache, _store) = setup();
    let key = CacheKey::new("k1");
    let tags = vec![TagName::new("t1")];

    let result = cache
        .get_or_populate(&key, Some(60), &tags, || async {
            Ok::<String, String>("v1".to_string())
        })
        .await
        .unwrap();
    assert_eq!(result.value, "v1");
    assert_eq!(result.source, CacheSource::LoaderCacheMiss);

    // Populated and readable without the loader
    assert_eq!(cache.get::<String>(&key).await, Some("v1".to_string()));
    let result = cache
        .get_or_populate(&key, Some(60), &tags, || async {
            Err::<String, String>("loader must not run".to_string())
        })
        .await
        .unwrap();
    assert_eq!(result.source, CacheSource::Hit);

    // Invalidating the tag evicts the entry
    assert!(cache.invalidate_tag(&TagName::new("t1")).await.unwrap());
    assert_eq!(cache.get::<String>(&key).await, None);
}

#[tokio::test]
async fn test_invalidation_is_scoped_to_one_tag() {
    let (cache, _store) = setup();
    let jobs_key = CacheKey::new("jobs:list");
    let users_key = CacheKey::new("users:list");

    cache
        .set_with_tags(&jobs_key, &"jobs", Some(60), &[TagName::new("t1")])
        .await
        .unwrap();
    cache
        .set_with_tags(&users_key, &"users", Some(60), &[TagName::new("t2")])
        .await
        .unwrap();

    assert!(cache.invalidate_tag(&TagName::new("t1")).await.unwrap());

    assert_eq!(cache.get::<String>(&jobs_key).await, None);
    assert_eq!(cache.get::<String>(&users_key).await, Some("users".to_string()));
}

#[tokio::test]
async fn test_multi_tag_entry_evicted_by_either_tag() {
    let (cache, _store) = setup();
    let key = CacheKey::new("company:7:jobs");

    let tags = vec![TagName::new("t1"), TagName::new("t2")];
    cache
        .set_with_tags(&key, &"payload", Some(60), &tags)
        .await
        .unwrap();

    assert!(cache.invalidate_tag(&TagName::new("t1")).await.unwrap());
    assert_eq!(cache.get::<String>(&key).await, None);

    // The other tag still lists the key, but nothing is left to evict
    assert!(!cache.invalidate_tag(&TagName::new("t2")).await.unwrap());
}

#[tokio::test]
async fn test_invalidated_tag_leaves_no_residue() {
    let (cache, store) = setup();
    let key = CacheKey::new("k1");

    cache
        .set_with_tags(&key, &"v", Some(60), &[TagName::new("jobs")])
        .await
        .unwrap();
    assert!(store.exists("tag:jobs".to_string()).await.unwrap());

    cache.invalidate_tag(&TagName::new("jobs")).await.unwrap();

    // The tag's own set key is deleted after the sweep
    assert!(!store.exists("tag:jobs".to_string()).await.unwrap());
}

#[tokio::test]
async fn test_ttl_expiry_evicts_without_invalidation() {
    let (cache, _store) = setup();
    let key = CacheKey::new("short-lived");

    cache
        .set_with_tags(&key, &"v", Some(1), &[])
        .await
        .unwrap();
    assert_eq!(cache.get::<String>(&key).await, Some("v".to_string()));

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.get::<String>(&key).await, None);
}

#[tokio::test]
async fn test_empty_and_zero_values_round_trip_as_hits() {
    let (cache, _store) = setup();
    let empty = CacheKey::new("empty");
    let zero = CacheKey::new("zero");

    cache.set_with_tags(&empty, &"", Some(60), &[]).await.unwrap();
    cache.set_with_tags(&zero, &0, Some(60), &[]).await.unwrap();

    let result = cache
        .get_or_populate(&empty, Some(60), &[], || async {
            Err::<String, String>("loader must not run".to_string())
        })
        .await
        .unwrap();
    assert_eq!(result.value, "");
    assert_eq!(result.source, CacheSource::Hit);

    let result = cache
        .get_or_populate(&zero, Some(60), &[], || async {
            Err::<i32, String>("loader must not run".to_string())
        })
        .await
        .unwrap();
    assert_eq!(result.value, 0);
    assert_eq!(result.source, CacheSource::Hit);
}

#[tokio::test]
async fn test_loader_failure_leaves_store_untouched() {
    let (cache, store) = setup();
    let key = CacheKey::new("k1");

    let result = cache
        .get_or_populate(&key, Some(60), &[TagName::new("t1")], || async {
            Err::<String, String>("source of record down".to_string())
        })
        .await;
    assert_eq!(result.unwrap_err(), "source of record down");

    assert!(!store.exists("k1".to_string()).await.unwrap());
    assert!(!store.exists("tag:t1".to_string()).await.unwrap());
}

#[tokio::test]
async fn test_structured_values_round_trip() {
    let (cache, _store) = setup();
    let key = derive_key("job:list", &(Some("berlin"), 1)).unwrap();

    let listings = vec![
        JobListing {
            id: 1,
            title: "Backend Engineer".to_string(),
        },
        JobListing {
            id: 2,
            title: "Data Engineer".to_string(),
        },
    ];

    let expected = listings.clone();
    let result = cache
        .get_or_populate(&key, Some(60), &[TagName::new("jobs")], || async move {
            Ok::<Vec<JobListing>, String>(expected)
        })
        .await
        .unwrap();
    assert_eq!(result.value, listings);

    assert_eq!(cache.get::<Vec<JobListing>>(&key).await, Some(listings));
}

#[tokio::test]
async fn test_delete_key_does_not_disturb_sibling_tag_members() {
    let (cache, _store) = setup();
    let a = CacheKey::new("a");
    let b = CacheKey::new("b");
    let tag = TagName::new("t");

    cache.set_with_tags(&a, &"va", Some(60), &[tag.clone()]).await.unwrap();
    cache.set_with_tags(&b, &"vb", Some(60), &[tag.clone()]).await.unwrap();

    assert!(cache.delete_key(&a).await.unwrap());
    assert_eq!(cache.get::<String>(&b).await, Some("vb".to_string()));

    // The dangling member for `a` is harmless; the sweep still evicts `b`
    assert!(cache.invalidate_tag(&tag).await.unwrap());
    assert_eq!(cache.get::<String>(&b).await, None);
}

#[tokio::test]
async fn test_entry_written_but_not_yet_tagged_survives_invalidation() {
    // The documented population/invalidation race: a value write that has
    // not yet reached its tag set is invisible to a concurrent sweep. The
    // stale entry survives until its TTL.
    let (cache, store) = setup();

    store
        .setex("k1".to_string(), "\"stale\"".to_string(), 60)
        .await
        .unwrap();

    assert!(!cache.invalidate_tag(&TagName::new("t1")).await.unwrap());
    assert_eq!(cache.get::<String>(&CacheKey::new("k1")).await, Some("stale".to_string()));
}

#[tokio::test]
async fn test_counters_and_expiry_helpers() {
    let (cache, store) = setup();

    assert_eq!(cache.increment("otp-attempts:a@b.c").await.unwrap(), 1);
    assert_eq!(cache.increment("otp-attempts:a@b.c").await.unwrap(), 2);
    assert_eq!(cache.decrement("otp-attempts:a@b.c").await.unwrap(), 1);
    assert!(cache.exists("otp-attempts:a@b.c").await.unwrap());

    assert!(cache.expire("otp-attempts:a@b.c", 1).await.unwrap());
    sleep(Duration::from_millis(1100)).await;
    assert!(!store.exists("otp-attempts:a@b.c".to_string()).await.unwrap());
}

#[tokio::test]
async fn test_corrupt_entry_is_dropped_and_refreshed() {
    let (cache, store) = setup();
    let key = CacheKey::new("k1");

    store
        .set("k1".to_string(), "not json{".to_string())
        .await
        .unwrap();

    let result = cache
        .get_or_populate(&key, Some(60), &[], || async {
            Ok::<String, String>("fresh".to_string())
        })
        .await
        .unwrap();
    assert_eq!(result.value, "fresh");
    assert_eq!(result.source, CacheSource::LoaderCacheCorrupted);

    // The refreshed entry is valid JSON again
    assert_eq!(cache.get::<String>(&key).await, Some("fresh".to_string()));
}
