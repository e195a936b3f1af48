//! Ticket lookups by composite and single-field indexes across an update.

use std::sync::Arc;

use guild_cache::cache::{CacheConfig, EntityCache, MemoryStore, RedisCacheManager};
use guild_cache::database::{MemorySource, Repository, SourceStore, Ticket};

const BY_OWNER: [&str; 3] = ["guild_id", "parent_id", "author_id"];
const BY_CHANNEL: [&str; 1] = ["channel_id"];

fn tickets(store: &MemoryStore) -> (Repository<Ticket>, Arc<MemorySource<Ticket>>) {
    let source = Arc::new(MemorySource::new());
    let manager = RedisCacheManager::new(Arc::new(store.clone()), CacheConfig::default(), Ticket::indexes())
        .expect("ticket indexes are valid");
    (Repository::new(EntityCache::new(manager, source.clone())), source)
}

#[tokio::test]
async fn channel_move_repoints_index() {
    let store = MemoryStore::default();
    let (repo, source) = tickets(&store);

    let mut ticket = Ticket::new("t1", "G", "P", "A");
    ticket.channel_id = Some("C".to_string());
    repo.save(&ticket).await.unwrap();

    let by_owner = repo.find_by(&BY_OWNER, &["G", "P", "A"]).await.unwrap().unwrap();
    let by_channel = repo.find_by(&BY_CHANNEL, &["C"]).await.unwrap().unwrap();
    assert_eq!(by_owner, by_channel);
    assert_eq!(by_owner.id, "t1");

    let reads = source.reads();
    repo.update("t1", |t| t.channel_id = Some("C2".to_string()))
        .await
        .unwrap()
        .unwrap();

    assert!(repo.find_by(&BY_CHANNEL, &["C"]).await.unwrap().is_none());
    // That lookup missed the cache and went upstream.
    assert!(source.reads() > reads + 1);

    let moved = repo.find_by(&BY_CHANNEL, &["C2"]).await.unwrap().unwrap();
    assert_eq!(moved.id, "t1");
    let by_owner = repo.find_by(&BY_OWNER, &["G", "P", "A"]).await.unwrap().unwrap();
    assert_eq!(by_owner.channel_id.as_deref(), Some("C2"));
}

#[tokio::test]
async fn ticket_without_channel_is_only_owner_indexed() {
    let store = MemoryStore::default();
    let (repo, _) = tickets(&store);

    repo.save(&Ticket::new("t2", "G", "P", "B")).await.unwrap();
    // Primary record + composite pointer; no channel pointer.
    assert_eq!(store.entry_count(), 2);
    assert!(repo.find_by(&BY_OWNER, &["G", "P", "B"]).await.unwrap().is_some());
}

#[tokio::test]
async fn upstream_write_with_snapshot_drops_old_channel_pointer() {
    let store = MemoryStore::default();
    let (repo, source) = tickets(&store);
    let cache = repo.cache();

    let mut ticket = Ticket::new("t3", "G", "P", "A");
    ticket.channel_id = Some("C".to_string());
    source.upsert(&ticket).await.unwrap();
    cache.on_upstream_write(&ticket, None).await.unwrap();

    // Another writer moved the ticket and reports the old channel.
    ticket.channel_id = Some("C2".to_string());
    source.upsert(&ticket).await.unwrap();
    let previous = [("channel_id".to_string(), "C".to_string())].into_iter().collect();
    cache.on_upstream_write(&ticket, Some(&previous)).await.unwrap();

    let def = cache.manager().definition(&BY_CHANNEL).unwrap();
    assert!(cache.manager().get_by_index(def, &["C"]).await.unwrap().is_none());
    assert!(cache.manager().get_by_index(def, &["C2"]).await.unwrap().is_some());
}
