//! Entity repository.
//!
//! The write path for one entity type. Every successful write is followed by
//! an explicit cache refresh carrying the old values of any indexed fields
//! that changed.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::SourceStore;
use crate::cache::{changed_fields, snapshot, CachedEntity, EntityCache};

/// Repository for entity type `E`.
pub struct Repository<E: CachedEntity> {
    source: Arc<dyn SourceStore<E>>,
    cache: EntityCache<E>,
}

impl<E: CachedEntity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
        }
    }
}

impl<E: CachedEntity> Repository<E> {
    /// Create a repository writing through the cache's own source.
    pub fn new(cache: EntityCache<E>) -> Self {
        Self {
            source: Arc::clone(cache.source()),
            cache,
        }
    }

    pub fn cache(&self) -> &EntityCache<E> {
        &self.cache
    }

    /// Get by primary id (cached).
    pub async fn get(&self, id: &str) -> Result<Option<E>> {
        self.cache.fetch(id).await
    }

    /// Get by a declared index (cached).
    pub async fn find_by(&self, fields: &[&str], values: &[&str]) -> Result<Option<E>> {
        self.cache.fetch_by_index(fields, values).await
    }

    /// Get an entity, creating it with `init` if it does not exist.
    pub async fn get_or_create<F>(&self, id: &str, init: F) -> Result<E>
    where
        F: FnOnce() -> E,
    {
        if let Some(entity) = self.get(id).await? {
            return Ok(entity);
        }

        let entity = init();
        self.save(&entity).await?;
        Ok(entity)
    }

    /// Save (upsert) and refresh the cache.
    ///
    /// A cache failure after the upsert is logged, not returned: the
    /// authoritative write already happened and TTL bounds the staleness.
    pub async fn save(&self, entity: &E) -> Result<()> {
        let id = entity.id();
        let previous = self.source.find_by_id(&id).await?;

        self.source.upsert(entity).await?;

        let changed = previous.as_ref().map(|old| changed_fields(old, entity));
        if let Err(e) = self.cache.on_upstream_write(entity, changed.as_ref()).await {
            warn!("Saved {} {} but cache refresh failed: {}", E::TYPE_TAG, id, e);
        }

        debug!("Saved {} {}", E::TYPE_TAG, id);
        Ok(())
    }

    /// Load, modify and save an entity. Returns `None` if it does not exist.
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<Option<E>>
    where
        F: FnOnce(&mut E),
    {
        let Some(mut entity) = self.source.find_by_id(id).await? else {
            return Ok(None);
        };

        apply(&mut entity);
        self.save(&entity).await?;
        Ok(Some(entity))
    }

    /// Delete upstream and drop every cached key of the deleted version.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let previous = self.source.find_by_id(id).await?;
        let removed = self.source.remove(id).await?;

        let result = match &previous {
            Some(old) => self.cache.invalidate_with(id, &snapshot(old)).await,
            None => self.cache.invalidate(id).await,
        };
        if let Err(e) = result {
            warn!("Deleted {} {} but cache invalidation failed: {}", E::TYPE_TAG, id, e);
        }

        debug!("Deleted {} {}: {}", E::TYPE_TAG, id, removed);
        Ok(removed)
    }
}
