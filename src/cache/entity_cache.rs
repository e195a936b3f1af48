//! Read-through / write-through cache for one entity type.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::{snapshot, CacheError, CachedEntity, FieldSnapshot, RedisCacheManager};
use crate::database::SourceStore;

/// Composes the cache engine with the authoritative store for `E`.
///
/// Reads fall back to the source on a miss and populate the cache. When the
/// cache is unreachable, reads are served from the source and nothing is
/// written back, so a recovering cache cannot be fed data that is already
/// outdated.
pub struct EntityCache<E: CachedEntity> {
    manager: RedisCacheManager<E>,
    source: Arc<dyn SourceStore<E>>,
}

impl<E: CachedEntity> Clone for EntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<E: CachedEntity> EntityCache<E> {
    pub fn new(manager: RedisCacheManager<E>, source: Arc<dyn SourceStore<E>>) -> Self {
        Self { manager, source }
    }

    pub fn manager(&self) -> &RedisCacheManager<E> {
        &self.manager
    }

    pub fn source(&self) -> &Arc<dyn SourceStore<E>> {
        &self.source
    }

    /// Get an entity by primary id.
    ///
    /// Absent upstream results are not cached.
    pub async fn fetch(&self, id: &str) -> Result<Option<E>> {
        match self.manager.get(id).await {
            Ok(Some(entity)) => return Ok(Some(entity)),
            Ok(None) => {}
            Err(e) => {
                warn!("Cache unavailable for {} {}, reading source: {}", E::TYPE_TAG, id, e);
                return self.source.find_by_id(id).await;
            }
        }

        let found = self.source.find_by_id(id).await?;
        if let Some(entity) = &found {
            self.populate(entity).await;
        }
        Ok(found)
    }

    /// Get an entity by a declared index.
    ///
    /// `fields` names the index and `values` is aligned with it. Values are
    /// canonicalised first (`"07"` and `"7"` name the same integer), so the
    /// cache key and the source filter agree. An index that was never
    /// declared for `E`, or a value no entity could hold, is an error.
    pub async fn fetch_by_index(&self, fields: &[&str], values: &[&str]) -> Result<Option<E>> {
        let def = self.manager.definition(fields)?;
        if values.len() != fields.len() {
            anyhow::bail!(
                "{} index {} takes {} value(s), got {}",
                E::TYPE_TAG,
                def,
                fields.len(),
                values.len()
            );
        }

        let canonical = self.manager.canonical_values(def, values)?;
        let values: Vec<&str> = canonical.iter().map(String::as_str).collect();
        let filter: Vec<(&str, &str)> = fields.iter().copied().zip(values.iter().copied()).collect();

        match self.manager.get_by_index(def, &values).await {
            Ok(Some(entity)) => return Ok(Some(entity)),
            Ok(None) => {}
            Err(e) => {
                warn!("Cache unavailable for {} {}, reading source: {}", E::TYPE_TAG, def, e);
                return self.source.find_by_filter(&filter).await;
            }
        }

        let found = self.source.find_by_filter(&filter).await?;
        if let Some(entity) = &found {
            // Writes every index pointer, not only the one queried.
            self.populate(entity).await;
        }
        Ok(found)
    }

    /// Refresh the cache after the authoritative store wrote `entity`.
    ///
    /// `previous` holds the old values of indexed fields that changed; fields
    /// it omits are taken from `entity`, so composite indexes with one changed
    /// member still resolve to their old keys. Invalidation runs before the
    /// new write, and self-healing reads only delete a pointer whose keys are
    /// unchanged since they read it, so the fresh pointers survive
    /// concurrent lookups.
    pub async fn on_upstream_write(&self, entity: &E, previous: Option<&FieldSnapshot>) -> Result<(), CacheError> {
        let old = previous.map(|changed| {
            let mut full = snapshot(entity);
            full.extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
            full
        });

        self.manager.invalidate(&entity.id(), old.as_ref()).await?;
        self.manager.set(entity).await
    }

    /// Drop a cached entity, e.g. after a delete that bypassed the write path.
    pub async fn invalidate(&self, id: &str) -> Result<(), CacheError> {
        self.manager.invalidate(id, None).await
    }

    /// Drop a cached entity and the pointers of the given old field values.
    pub async fn invalidate_with(&self, id: &str, previous: &FieldSnapshot) -> Result<(), CacheError> {
        self.manager.invalidate(id, Some(previous)).await
    }

    async fn populate(&self, entity: &E) {
        match self.manager.set(entity).await {
            Ok(()) => debug!("Populated {} {} from source", E::TYPE_TAG, entity.id()),
            Err(e) => warn!("Failed to cache {} {}: {}", E::TYPE_TAG, entity.id(), e),
        }
    }
}

impl<E: CachedEntity> std::fmt::Debug for EntityCache<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("entity", &E::TYPE_TAG)
            .field("manager", &self.manager)
            .finish()
    }
}
