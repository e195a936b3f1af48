//! Indexed cache engine.
//!
//! One primary record per entity, plus one pointer per satisfiable index
//! definition. Pointers hold the primary id only, so every index resolves to
//! the same payload and an update rewrites it once.
//!
//! The engine never talks to the authoritative store; misses are reported
//! to the caller, which decides whether to fall back.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use super::index::validate_definitions;
use super::{
    CacheConfig, CacheError, CacheRecord, CacheStore, CachedEntity, FieldSnapshot,
    IndexDefinition, KeyBuilder,
};

/// Cache-aside engine for entity type `E`.
pub struct RedisCacheManager<E> {
    store: Arc<dyn CacheStore>,
    keys: KeyBuilder,
    indexes: Arc<[IndexDefinition]>,
    config: CacheConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for RedisCacheManager<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            indexes: Arc::clone(&self.indexes),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: CachedEntity> RedisCacheManager<E> {
    /// Create an engine for `E` with its declared index definitions.
    ///
    /// # Errors
    /// Returns error if the config or any index definition is invalid.
    pub fn new(
        store: Arc<dyn CacheStore>,
        config: CacheConfig,
        indexes: Vec<IndexDefinition>,
    ) -> Result<Self, CacheError> {
        config.validate()?;
        validate_definitions::<E>(&indexes)?;

        debug!(
            "Cache manager for {} on {} with {} index(es), ttl {:?}",
            E::TYPE_TAG,
            store.name(),
            indexes.len(),
            config.ttl
        );

        Ok(Self {
            keys: KeyBuilder::new(&config.key_prefix, E::TYPE_TAG),
            store,
            indexes: indexes.into(),
            config,
            _entity: PhantomData,
        })
    }

    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve a declared index definition by its field names.
    pub fn definition(&self, fields: &[&str]) -> Result<&IndexDefinition, CacheError> {
        self.indexes
            .iter()
            .find(|def| def.matches(fields))
            .ok_or_else(|| CacheError::UnknownIndex {
                entity: E::TYPE_TAG,
                fields: fields.iter().map(|f| f.to_string()).collect(),
            })
    }

    /// Read the primary record for `id`.
    ///
    /// A record that fails to decode is deleted and reported as a miss.
    pub async fn get(&self, id: &str) -> Result<Option<E>, CacheError> {
        let key = self.keys.primary_key(id);
        Ok(self.load(&key).await?.map(|record| record.payload))
    }

    /// Read through an index pointer.
    ///
    /// Dangling pointers (primary expired or deleted) and pointers whose
    /// target no longer carries `values` are deleted and reported as a miss.
    /// The delete only lands if neither key changed since it was read, so a
    /// concurrent [`Self::set`] keeps its fresh pointer.
    pub async fn get_by_index(
        &self,
        def: &IndexDefinition,
        values: &[&str],
    ) -> Result<Option<E>, CacheError> {
        if values.len() != def.fields().len() {
            return Ok(None);
        }
        let canonical = self.canonical_values(def, values)?;
        let wanted: Vec<Option<&str>> = canonical.iter().map(|v| Some(v.as_str())).collect();
        let Some(index_key) = self.keys.index_key(def, &wanted) else {
            return Ok(None);
        };

        let Some(pointer) = self.store.get(&index_key).await? else {
            debug!("Cache MISS {}", index_key);
            return Ok(None);
        };

        let id = match String::from_utf8(pointer) {
            Ok(id) => id,
            Err(e) => {
                warn!("Index pointer {} is not a valid id, dropping it", index_key);
                let bytes = e.into_bytes();
                self.heal(&index_key, &[(index_key.as_str(), Some(bytes.as_slice()))]).await;
                return Ok(None);
            }
        };

        let primary_key = self.keys.primary_key(&id);
        let raw = self.store.get(&primary_key).await?;
        let record = match &raw {
            Some(bytes) => self.decode_or_heal(&primary_key, bytes).await,
            None => None,
        };
        let Some(record) = record else {
            debug!("Index pointer {} -> {} dangles, dropping it", index_key, id);
            let guard = [(index_key.as_str(), Some(id.as_bytes())), (primary_key.as_str(), None)];
            self.heal(&index_key, &guard).await;
            return Ok(None);
        };

        let current = def.values_of(&record.payload);
        let still_matches = current
            .iter()
            .zip(&wanted)
            .all(|(have, want)| have.as_deref() == *want);
        if !still_matches {
            debug!("Index pointer {} -> {} is stale, dropping it", index_key, id);
            let guard = [
                (index_key.as_str(), Some(id.as_bytes())),
                (primary_key.as_str(), raw.as_deref()),
            ];
            self.heal(&index_key, &guard).await;
            return Ok(None);
        }

        debug!("Cache HIT {} -> {} (age {}ms)", index_key, id, record.age_ms());
        Ok(Some(record.payload))
    }

    /// Canonical form of lookup `values` for `def`, as the entity renders them.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidValue`] for a value the field can never hold.
    pub fn canonical_values(&self, def: &IndexDefinition, values: &[&str]) -> Result<Vec<String>, CacheError> {
        def.fields()
            .iter()
            .zip(values)
            .map(|(field, raw)| {
                E::canonical(field, raw).ok_or_else(|| CacheError::InvalidValue {
                    entity: E::TYPE_TAG,
                    field: field.clone(),
                    value: raw.to_string(),
                })
            })
            .collect()
    }

    /// Write the primary record and every satisfiable index pointer in one
    /// atomic batch.
    ///
    /// Definitions the entity cannot satisfy are skipped. Pointers for old
    /// field values are not touched here; see [`Self::invalidate`].
    pub async fn set(&self, entity: &E) -> Result<(), CacheError> {
        let id = entity.id();
        let primary_key = self.keys.primary_key(&id);
        let payload = CacheRecord::new(entity.clone(), self.config.ttl).encode(&primary_key)?;

        let mut entries = Vec::with_capacity(1 + self.indexes.len());
        entries.push((primary_key, payload));
        for def in self.indexes.iter() {
            match self.keys.index_key(def, &def.values_of(entity)) {
                Some(key) => entries.push((key, id.clone().into_bytes())),
                None => debug!("{} {} not indexable by {}", E::TYPE_TAG, id, def),
            }
        }

        self.store.multi_set(&entries, self.config.ttl).await?;
        debug!("Cached {} {} with {} key(s)", E::TYPE_TAG, id, entries.len());
        Ok(())
    }

    /// Delete the primary record and the index pointers of its known versions.
    ///
    /// Pointers are derived from `previous` (the field values the entity had
    /// before the change) and from the cached copy if one is still present.
    pub async fn invalidate(&self, id: &str, previous: Option<&FieldSnapshot>) -> Result<(), CacheError> {
        let primary_key = self.keys.primary_key(id);
        let mut doomed = vec![primary_key.clone()];

        if let Some(snapshot) = previous {
            self.push_index_keys(&mut doomed, |def| def.values_in(snapshot));
        }
        if let Some(record) = self.load(&primary_key).await? {
            self.push_index_keys(&mut doomed, |def| def.values_of(&record.payload));
        }

        self.store.delete(&doomed).await?;
        debug!("Invalidated {} {} ({} key(s))", E::TYPE_TAG, id, doomed.len());
        Ok(())
    }

    fn push_index_keys<F>(&self, keys: &mut Vec<String>, values: F)
    where
        F: Fn(&IndexDefinition) -> Vec<Option<String>>,
    {
        for def in self.indexes.iter() {
            if let Some(key) = self.keys.index_key(def, &values(def))
                && !keys.contains(&key)
            {
                keys.push(key);
            }
        }
    }

    async fn load(&self, key: &str) -> Result<Option<CacheRecord<E>>, CacheError> {
        let Some(bytes) = self.store.get(key).await? else {
            debug!("Cache MISS {}", key);
            return Ok(None);
        };
        Ok(self.decode_or_heal(key, &bytes).await)
    }

    async fn decode_or_heal(&self, key: &str, bytes: &[u8]) -> Option<CacheRecord<E>> {
        match CacheRecord::<E>::decode(bytes) {
            Ok(record) => {
                debug!("Cache HIT {} (age {}ms)", key, record.age_ms());
                Some(record)
            }
            Err(e) => {
                warn!("Dropping undecodable record {}: {}", key, e);
                self.heal(key, &[(key, Some(bytes))]).await;
                None
            }
        }
    }

    /// Best-effort delete of a bad key, skipped if `expected` no longer
    /// holds. Failure only delays cleanup.
    async fn heal(&self, key: &str, expected: &[(&str, Option<&[u8]>)]) {
        match self.store.delete_if(key, expected).await {
            Ok(true) => {}
            Ok(false) => debug!("Kept {}, rewritten since it was read", key),
            Err(e) => warn!("Failed to drop stale key {}: {}", key, e),
        }
    }
}

impl<E> std::fmt::Debug for RedisCacheManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheManager")
            .field("keys", &self.keys)
            .field("indexes", &self.indexes)
            .field("ttl", &self.config.ttl)
            .finish()
    }
}
