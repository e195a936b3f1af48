//! Cache module - indexed cache-aside layer.
//!
//! Keeps a remote key-value store in step with the authoritative database
//! for entities that are looked up by primary id and by secondary field
//! tuples.
//!
//! ## Architecture
//!
//! - `IndexDefinition` - field tuples an entity type is lookupable by
//! - `KeyBuilder` - deterministic primary and index keys
//! - `CacheStore` - transport (`RedisStore`, or `MemoryStore` on Moka)
//! - `RedisCacheManager` - primary record + index pointers, invalidation
//! - `EntityCache` - read-through / write-through over a `SourceStore`
//! - `CacheContext` - one cache per entity type, built at startup
//!
//! ## Usage
//!
//! ```rust,ignore
//! let context = CacheContext::new(store, &CacheConfig::default(), Sources::mongo(&db))?;
//!
//! let ticket = context.tickets.find_by(&["channel_id"], &[channel_id]).await?;
//! context.tickets.save(&updated).await?;
//! ```

mod config;
mod context;
pub(crate) mod entity;
mod entity_cache;
mod error;
mod index;
mod keys;
mod manager;
mod record;
mod store;

pub use config::CacheConfig;
pub use context::{CacheContext, Sources};
pub use entity::{canonical_int, changed_fields, snapshot, CachedEntity, FieldSnapshot};
pub use entity_cache::EntityCache;
pub use error::{BoxError, CacheError};
pub use index::{validate_definitions, IndexDefinition};
pub use keys::KeyBuilder;
pub use manager::RedisCacheManager;
pub use record::CacheRecord;
pub use store::{CacheStore, MemoryStore, RedisStore};
