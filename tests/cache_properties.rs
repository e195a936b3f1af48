//! Engine properties over the in-process store.

use std::sync::Arc;

use guild_cache::cache::{snapshot, CacheConfig, CacheContext, MemoryStore, RedisCacheManager, Sources};
use guild_cache::database::{GenericEntity, LogChannel, LogEvent, ModCase, CaseAction, UserLevel};
use serde_json::json;

fn levels(store: &MemoryStore) -> RedisCacheManager<UserLevel> {
    RedisCacheManager::new(Arc::new(store.clone()), CacheConfig::default(), UserLevel::indexes()).unwrap()
}

#[tokio::test]
async fn index_and_primary_agree_for_every_entity() {
    let store = MemoryStore::default();
    let cache = levels(&store);

    for user in ["u1", "u2", "u3"] {
        let record = UserLevel::new("g", user);
        cache.set(&record).await.unwrap();

        let def = cache.definition(&["guild_id", "user_id"]).unwrap();
        let by_index = cache.get_by_index(def, &["g", user]).await.unwrap().unwrap();
        let by_id = cache.get(&record.id).await.unwrap().unwrap();
        assert_eq!(by_index.id, by_id.id);
    }
}

#[tokio::test]
async fn reassigned_values_resolve_to_the_new_owner() {
    let store = MemoryStore::default();
    let cache: RedisCacheManager<GenericEntity> =
        RedisCacheManager::new(Arc::new(store.clone()), CacheConfig::default(), GenericEntity::indexes()).unwrap();
    let def = cache.definition(&["guild_id", "kind", "key"]).unwrap().clone();

    let old = GenericEntity {
        id: "e-old".to_string(),
        ..GenericEntity::new("g", "tag", "faq", json!("old answer"))
    };
    cache.set(&old).await.unwrap();
    cache.invalidate(&old.id, Some(&snapshot(&old))).await.unwrap();

    let new = GenericEntity {
        id: "e-new".to_string(),
        ..GenericEntity::new("g", "tag", "faq", json!("new answer"))
    };
    cache.set(&new).await.unwrap();

    let found = cache.get_by_index(&def, &["g", "tag", "faq"]).await.unwrap().unwrap();
    assert_eq!(found.id, "e-new");
    assert_eq!(found.data, json!("new answer"));
}

#[tokio::test]
async fn cold_cache_matches_warm_cache() {
    let store = MemoryStore::default();
    let context = CacheContext::new(Arc::new(store.clone()), &CacheConfig::default(), Sources::memory()).unwrap();

    let mut case = ModCase::new("g", 7, CaseAction::Ban, "target", "mod");
    case.log_message_id = Some("log-1".to_string());
    context.mod_cases.save(&case).await.unwrap();
    let route = LogChannel::new("g", LogEvent::Moderation, "mod-log");
    context.log_channels.save(&route).await.unwrap();

    let mut warm_keys: Vec<String> = store.entries().into_iter().map(|(k, _)| k).collect();
    warm_keys.sort();

    store.clear();
    assert_eq!(store.entry_count(), 0);

    let by_number = context.mod_cases.find_by(&["guild_id", "case_number"], &["g", "7"]).await.unwrap();
    assert_eq!(by_number, Some(case.clone()));
    let by_event = context
        .log_channels
        .find_by(&["guild_id", "event_type"], &["g", "moderation"])
        .await
        .unwrap();
    assert_eq!(by_event, Some(route));

    let mut cold_keys: Vec<String> = store.entries().into_iter().map(|(k, _)| k).collect();
    cold_keys.sort();
    assert_eq!(cold_keys, warm_keys);

    let by_log = context.mod_cases.find_by(&["log_message_id"], &["log-1"]).await.unwrap();
    assert_eq!(by_log.map(|c| c.id), Some(case.id));
}
