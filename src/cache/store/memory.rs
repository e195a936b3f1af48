//! In-process cache store on Moka.
//!
//! Mirrors the Redis store's semantics (per-key TTL, atomic batches) for
//! tests and for single-instance deployments without Redis.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::sync::Cache;
use moka::Expiry;
use parking_lot::RwLock;

use super::{ttl_secs, CacheStore};
use crate::cache::CacheError;

#[derive(Clone)]
struct StoredValue {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &StoredValue, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-backed cache store.
///
/// Readers take a shared fence and batches take it exclusively, so a reader
/// never observes half of a `multi_set` or `delete`.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, StoredValue>,
    fence: Arc<RwLock<()>>,
}

impl MemoryStore {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
            fence: Arc::new(RwLock::new(())),
        }
    }

    /// Number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    /// Snapshot of all live entries, for inspection in tests and tooling.
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let _guard = self.fence.read();
        self.inner
            .iter()
            .map(|(k, v)| (k.as_ref().clone(), v.bytes.to_vec()))
            .collect()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let _guard = self.fence.write();
        self.inner.invalidate_all();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let _guard = self.fence.read();
        Ok(self.inner.get(key).map(|v| v.bytes.to_vec()))
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        ttl_secs(ttl)?;
        let _guard = self.fence.write();
        self.inner.insert(
            key.to_string(),
            StoredValue {
                bytes: Arc::from(value),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        let _guard = self.fence.write();
        for key in keys {
            self.inner.invalidate(key);
        }
        Ok(())
    }

    async fn delete_if(&self, key: &str, expected: &[(&str, Option<&[u8]>)]) -> Result<bool, CacheError> {
        let _guard = self.fence.write();
        let unchanged = expected.iter().all(|(name, want)| {
            let have = self.inner.get(*name);
            have.as_ref().map(|v| &*v.bytes) == *want
        });
        if unchanged {
            self.inner.invalidate(key);
        }
        Ok(unchanged)
    }

    async fn multi_set(&self, entries: &[(String, Vec<u8>)], ttl: Duration) -> Result<(), CacheError> {
        ttl_secs(ttl)?;
        let _guard = self.fence.write();
        for (key, value) in entries {
            self.inner.insert(
                key.clone(),
                StoredValue {
                    bytes: Arc::from(value.as_slice()),
                    ttl,
                },
            );
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ttl() -> Duration {
        Duration::from_secs(60)
    }

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::default();
        store.set_with_ttl("a", b"1", ttl()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some(&b"1"[..]));

        store.delete(&["a".to_string(), "missing".to_string()]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn multi_set_writes_every_entry() {
        let store = MemoryStore::default();
        let entries = vec![
            ("p".to_string(), b"payload".to_vec()),
            ("i".to_string(), b"p".to_vec()),
        ];
        store.multi_set(&entries, ttl()).await.unwrap();
        assert_eq!(store.entry_count(), 2);
        assert_eq!(store.get("i").await.unwrap().as_deref(), Some(&b"p"[..]));
    }

    #[tokio::test]
    async fn delete_if_checks_expected_values() {
        let store = MemoryStore::default();
        store.set_with_ttl("ptr", b"1", ttl()).await.unwrap();

        // Target present, so the pointer is not dangling.
        store.set_with_ttl("rec", b"v1", ttl()).await.unwrap();
        let removed = store
            .delete_if("ptr", &[("ptr", Some(&b"1"[..])), ("rec", None)])
            .await
            .unwrap();
        assert!(!removed);
        assert!(store.get("ptr").await.unwrap().is_some());

        let removed = store
            .delete_if("ptr", &[("ptr", Some(&b"1"[..])), ("rec", Some(&b"v1"[..]))])
            .await
            .unwrap();
        assert!(removed);
        assert_eq!(store.get("ptr").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let store = MemoryStore::default();
        store
            .set_with_ttl("short", b"x", Duration::from_secs(1))
            .await
            .unwrap();
        store.set_with_ttl("long", b"y", ttl()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sub_second_ttl_is_rejected() {
        let store = MemoryStore::default();
        let err = store
            .set_with_ttl("a", b"1", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
    }
}
