//! Guild cache - indexed cache-aside layer for the guild management bot.
//!
//! Keeps Redis synchronized with MongoDB for entities that are looked up
//! by primary id and by secondary field combinations.
//!
//! ## Architecture
//!
//! - `cache` - index definitions, key derivation, the cache engine and
//!   the per-entity read-through caches
//! - `database` - MongoDB access, entity models and the write path that
//!   refreshes the cache
//! - `config` - Environment configuration

pub mod cache;
pub mod config;
pub mod database;

pub use cache::{CacheConfig, CacheContext, CacheError, CacheStore, EntityCache, RedisCacheManager, Sources};
pub use config::Config;
pub use database::{Database, Repository, SourceStore};
