//! Cache context - one explicitly constructed cache per entity type.
//!
//! Built once at startup and shared behind an `Arc`; nothing here is global.

use std::sync::Arc;

use tracing::info;

use super::{CacheConfig, CacheError, CacheStore, CachedEntity, EntityCache, IndexDefinition, RedisCacheManager};
use crate::database::{
    Database, GenericEntity, GuildConfig, LogChannel, MemorySource, ModCase, MongoEntity, MongoSource,
    Repository, SourceStore, Suggestion, Ticket, UserLevel,
};

/// Sources for every cached entity type.
pub struct Sources {
    pub guild_configs: Arc<dyn SourceStore<GuildConfig>>,
    pub mod_cases: Arc<dyn SourceStore<ModCase>>,
    pub user_levels: Arc<dyn SourceStore<UserLevel>>,
    pub tickets: Arc<dyn SourceStore<Ticket>>,
    pub suggestions: Arc<dyn SourceStore<Suggestion>>,
    pub log_channels: Arc<dyn SourceStore<LogChannel>>,
    pub entities: Arc<dyn SourceStore<GenericEntity>>,
}

impl Sources {
    /// MongoDB collections for every entity type.
    pub fn mongo(db: &Database) -> Self {
        fn source<E: MongoEntity>(db: &Database) -> Arc<dyn SourceStore<E>> {
            Arc::new(MongoSource::<E>::new(db))
        }

        Self {
            guild_configs: source(db),
            mod_cases: source(db),
            user_levels: source(db),
            tickets: source(db),
            suggestions: source(db),
            log_channels: source(db),
            entities: source(db),
        }
    }

    /// In-process sources, for tests and dry runs.
    pub fn memory() -> Self {
        Self {
            guild_configs: Arc::new(MemorySource::new()),
            mod_cases: Arc::new(MemorySource::new()),
            user_levels: Arc::new(MemorySource::new()),
            tickets: Arc::new(MemorySource::new()),
            suggestions: Arc::new(MemorySource::new()),
            log_channels: Arc::new(MemorySource::new()),
            entities: Arc::new(MemorySource::new()),
        }
    }
}

/// One repository per entity type, each with its own cache instance.
#[derive(Clone)]
pub struct CacheContext {
    pub guild_configs: Repository<GuildConfig>,
    pub mod_cases: Repository<ModCase>,
    pub user_levels: Repository<UserLevel>,
    pub tickets: Repository<Ticket>,
    pub suggestions: Repository<Suggestion>,
    pub log_channels: Repository<LogChannel>,
    pub entities: Repository<GenericEntity>,
    store: Arc<dyn CacheStore>,
}

impl CacheContext {
    /// Build every entity cache over `store`, validating all index
    /// definitions up front.
    ///
    /// # Errors
    /// Returns error if any definition or TTL preset is invalid.
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig, sources: Sources) -> Result<Self, CacheError> {
        let context = Self {
            guild_configs: repo(&store, config.cold_data(), GuildConfig::indexes(), sources.guild_configs)?,
            mod_cases: repo(&store, config.lazy_load(), ModCase::indexes(), sources.mod_cases)?,
            user_levels: repo(&store, config.hot_data(), UserLevel::indexes(), sources.user_levels)?,
            tickets: repo(&store, config.lazy_load(), Ticket::indexes(), sources.tickets)?,
            suggestions: repo(&store, config.lazy_load(), Suggestion::indexes(), sources.suggestions)?,
            log_channels: repo(&store, config.hot_data(), LogChannel::indexes(), sources.log_channels)?,
            entities: repo(&store, config.clone(), GenericEntity::indexes(), sources.entities)?,
            store,
        };

        info!("Cache context initialized on {}", context.store.name());
        Ok(context)
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}

fn repo<E: CachedEntity>(
    store: &Arc<dyn CacheStore>,
    config: CacheConfig,
    indexes: Vec<IndexDefinition>,
    source: Arc<dyn SourceStore<E>>,
) -> Result<Repository<E>, CacheError> {
    let manager = RedisCacheManager::new(Arc::clone(store), config, indexes)?;
    Ok(Repository::new(EntityCache::new(manager, source)))
}

impl std::fmt::Debug for CacheContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheContext")
            .field("store", &self.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::database::LogEvent;

    #[tokio::test]
    async fn every_declared_index_is_valid() {
        let context = CacheContext::new(Arc::new(MemoryStore::default()), &CacheConfig::default(), Sources::memory());
        assert!(context.is_ok());
    }

    #[tokio::test]
    async fn entity_types_do_not_share_keys() {
        let store = MemoryStore::default();
        let context = CacheContext::new(Arc::new(store.clone()), &CacheConfig::default(), Sources::memory()).unwrap();

        let route = LogChannel::new("g", LogEvent::Moderation, "c");
        context.log_channels.save(&route).await.unwrap();
        let generic = GenericEntity::new("g", "tag", "rules", serde_json::json!({ "text": "be nice" }));
        context.entities.save(&generic).await.unwrap();

        let found = context
            .log_channels
            .find_by(&["guild_id", "event_type"], &["g", "moderation"])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.channel_id, "c");
        assert!(context.tickets.get(&route.id).await.unwrap().is_none());
        assert_eq!(store.entry_count(), 4);
    }
}
