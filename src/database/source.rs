//! Authoritative store access.
//!
//! The cache layer reads through [`SourceStore`] on a miss; the write path in
//! [`super::Repository`] uses the same trait to persist before notifying the
//! cache.

use std::marker::PhantomData;

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;
use tracing::debug;

use super::Database;
use crate::cache::CachedEntity;

/// Read/write access to the ground truth for entity type `E`.
#[async_trait]
pub trait SourceStore<E: CachedEntity>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<E>>;

    /// First entity whose fields equal every `(field, value)` constraint.
    async fn find_by_filter(&self, filter: &[(&str, &str)]) -> Result<Option<E>>;

    /// Insert or replace `entity`.
    async fn upsert(&self, entity: &E) -> Result<()>;

    /// Delete by id, returning whether anything was removed.
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// MongoDB mapping for a cached entity.
pub trait MongoEntity: CachedEntity + Unpin {
    /// Collection holding this entity.
    const COLLECTION: &'static str;

    /// Document field holding the primary id.
    const ID_FIELD: &'static str = "_id";

    /// BSON value used when filtering `field` by its string form.
    fn filter_value(_field: &str, raw: &str) -> Result<Bson> {
        Ok(Bson::String(raw.to_string()))
    }
}

/// Parse a numeric filter value, for entities with integer fields.
pub fn int_filter(field: &str, raw: &str) -> Result<Bson> {
    let value: i64 = raw
        .parse()
        .with_context(|| format!("{field} must be an integer, got {raw:?}"))?;
    Ok(Bson::Int64(value))
}

/// Collection-backed source store.
pub struct MongoSource<E: MongoEntity> {
    collection: Collection<E>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: MongoEntity> MongoSource<E> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(E::COLLECTION),
            _entity: PhantomData,
        }
    }

    fn id_filter(id: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(E::ID_FIELD, id);
        filter
    }
}

#[async_trait]
impl<E: MongoEntity> SourceStore<E> for MongoSource<E> {
    async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
        let result = self.collection.find_one(Self::id_filter(id)).await?;
        debug!("DB get {} {}: {:?}", E::TYPE_TAG, id, result.is_some());
        Ok(result)
    }

    async fn find_by_filter(&self, filter: &[(&str, &str)]) -> Result<Option<E>> {
        let mut query = Document::new();
        for (field, raw) in filter {
            query.insert(*field, E::filter_value(field, raw)?);
        }

        let result = self.collection.find_one(query).await?;
        debug!("DB find {} by {:?}: {:?}", E::TYPE_TAG, filter, result.is_some());
        Ok(result)
    }

    async fn upsert(&self, entity: &E) -> Result<()> {
        let id = entity.id();
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(Self::id_filter(&id), entity)
            .with_options(options)
            .await?;

        debug!("Saved {} {}", E::TYPE_TAG, id);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        debug!("Deleted {} {}: {}", E::TYPE_TAG, id, result.deleted_count > 0);
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_filter_parses_or_explains() {
        assert_eq!(int_filter("case_number", "12").unwrap(), Bson::Int64(12));
        let err = int_filter("case_number", "twelve").unwrap_err();
        assert!(err.to_string().contains("case_number"));
    }

    #[test]
    fn string_fields_filter_verbatim() {
        use crate::database::{ModCase, Ticket};

        assert_eq!(Ticket::filter_value("channel_id", "07").unwrap(), Bson::String("07".into()));
        assert_eq!(ModCase::filter_value("guild_id", "07").unwrap(), Bson::String("07".into()));
        assert_eq!(ModCase::filter_value("case_number", "07").unwrap(), Bson::Int64(7));
    }
}
