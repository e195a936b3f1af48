//! Cache store transport.
//!
//! A thin boundary over the remote key-value store. The engine needs only
//! these primitives; batches are atomic so a primary record and its index
//! pointers appear together or not at all.

mod memory;
mod redis;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use super::CacheError;

/// Key-value transport used by the cache engine.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value, `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write a single value with a lifetime.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Delete all `keys` in one atomic operation.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Delete `key` only while every `(key, value)` in `expected` still
    /// holds, `None` meaning absent. Check and delete are atomic.
    ///
    /// Returns whether `key` was removed.
    async fn delete_if(&self, key: &str, expected: &[(&str, Option<&[u8]>)]) -> Result<bool, CacheError>;

    /// Write all `entries` with the same lifetime in one atomic operation.
    async fn multi_set(&self, entries: &[(String, Vec<u8>)], ttl: Duration) -> Result<(), CacheError>;

    /// Round trip to check the store is reachable.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Whole seconds for a store TTL. Sub-second lifetimes are rejected.
pub(crate) fn ttl_secs(ttl: Duration) -> Result<u64, CacheError> {
    match ttl.as_secs() {
        0 => Err(CacheError::InvalidTtl(ttl)),
        secs => Ok(secs),
    }
}

/// Bound a store call so a partitioned cache never stalls the caller.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CacheError::Timeout(limit))?
}
