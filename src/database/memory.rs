//! In-process source store.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use super::SourceStore;
use crate::cache::CachedEntity;

/// `DashMap`-backed ground truth, for tests and tooling.
///
/// Counts reads so callers can tell cache hits from fallbacks.
pub struct MemorySource<E: CachedEntity> {
    rows: DashMap<String, E>,
    reads: AtomicU64,
}

impl<E: CachedEntity> MemorySource<E> {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            reads: AtomicU64::new(0),
        }
    }

    /// Number of `find_*` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<E: CachedEntity> Default for MemorySource<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: CachedEntity> SourceStore<E> for MemorySource<E> {
    async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows.get(id).map(|row| row.value().clone()))
    }

    async fn find_by_filter(&self, filter: &[(&str, &str)]) -> Result<Option<E>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let found = self.rows.iter().find(|row| {
            filter
                .iter()
                .all(|(field, value)| row.value().field(field).as_deref() == Some(*value))
        });
        Ok(found.map(|row| row.value().clone()))
    }

    async fn upsert(&self, entity: &E) -> Result<()> {
        self.rows.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.rows.remove(id).is_some())
    }
}
