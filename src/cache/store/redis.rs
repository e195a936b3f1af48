//! Redis-backed cache store.

use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{bounded, ttl_secs, CacheStore};
use crate::cache::CacheError;

/// Deletes KEYS[1] when every further key still holds its expected value.
/// ARGV carries one `(present, value)` pair per guarded key.
const DELETE_IF_SCRIPT: &str = r"
for i = 2, #KEYS do
    local current = redis.call('GET', KEYS[i])
    if ARGV[2 * i - 3] == '1' then
        if current ~= ARGV[2 * i - 2] then
            return 0
        end
    elseif current then
        return 0
    end
end
return redis.call('DEL', KEYS[1])
";

/// Cache store over a Redis connection manager.
///
/// The manager multiplexes one connection and reconnects on its own, so
/// cloning this store is cheap. Every call is bounded by `op_timeout`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connect to Redis at `url`.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the first connection fails
    /// within `op_timeout`.
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let conn = bounded(op_timeout, async {
            ConnectionManager::new(client).await.map_err(CacheError::from)
        })
        .await?;

        info!("Successfully connected to Redis");
        Ok(Self { conn, op_timeout })
    }

    /// Wrap an existing connection manager.
    pub fn from_manager(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let secs = ttl_secs(ttl)?;
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            let _: () = conn.set_ex(key, value, secs).await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            // DEL with several keys is a single atomic command.
            let removed: usize = conn.del(keys).await?;
            debug!("Deleted {} of {} keys", removed, keys.len());
            Ok(())
        })
        .await
    }

    async fn delete_if(&self, key: &str, expected: &[(&str, Option<&[u8]>)]) -> Result<bool, CacheError> {
        let script = ::redis::Script::new(DELETE_IF_SCRIPT);
        let mut invocation = script.key(key);
        for (guarded, value) in expected {
            invocation
                .key(*guarded)
                .arg(if value.is_some() { "1" } else { "0" })
                .arg(value.unwrap_or_default());
        }

        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            let removed: i64 = invocation.invoke_async(&mut conn).await?;
            Ok(removed > 0)
        })
        .await
    }

    async fn multi_set(&self, entries: &[(String, Vec<u8>)], ttl: Duration) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }

        let secs = ttl_secs(ttl)?;
        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.cmd("SET")
                .arg(key)
                .arg(value.as_slice())
                .arg("EX")
                .arg(secs)
                .ignore();
        }

        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            let _: () = pipe.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            let _: String = ::redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::entity::testing::Probe;
    use crate::cache::{CacheConfig, IndexDefinition, RedisCacheManager};

    // The ignored tests need a running Redis server:
    // docker run -d -p 6379:6379 redis:latest

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    async fn store() -> RedisStore {
        RedisStore::connect(&redis_url(), Duration::from_secs(2)).await.unwrap()
    }

    /// Key namespace private to one test run.
    fn scoped(name: &str) -> String {
        format!("gc-test-{}-{}", std::process::id(), name)
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_unavailable() {
        let err = RedisStore::connect("redis://127.0.0.1:1", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let err = RedisStore::connect("not a url", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Transport(_)));
    }

    #[tokio::test]
    #[ignore] // requires Redis
    async fn set_get_round_trip() {
        let store = store().await;
        let key = scoped("round-trip");
        store.set_with_ttl(&key, b"payload", Duration::from_secs(30)).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"payload"[..]));
        store.delete(std::slice::from_ref(&key)).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // requires Redis
    async fn multi_set_applies_ttl_to_every_key() {
        let store = store().await;
        let entries = vec![
            (scoped("batch-a"), b"a".to_vec()),
            (scoped("batch-b"), b"b".to_vec()),
        ];
        store.multi_set(&entries, Duration::from_secs(30)).await.unwrap();

        let mut conn = store.conn.clone();
        for (key, value) in &entries {
            assert_eq!(store.get(key).await.unwrap().as_ref(), Some(value));
            let ttl: i64 = ::redis::cmd("TTL").arg(key).query_async(&mut conn).await.unwrap();
            assert!(ttl > 0 && ttl <= 30, "ttl {ttl} for {key}");
        }

        let keys: Vec<String> = entries.into_iter().map(|(k, _)| k).collect();
        store.delete(&keys).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // requires Redis
    async fn delete_removes_every_key() {
        let store = store().await;
        let keys = vec![scoped("del-a"), scoped("del-b"), scoped("del-missing")];
        store.set_with_ttl(&keys[0], b"a", Duration::from_secs(30)).await.unwrap();
        store.set_with_ttl(&keys[1], b"b", Duration::from_secs(30)).await.unwrap();

        store.delete(&keys).await.unwrap();
        for key in &keys {
            assert_eq!(store.get(key).await.unwrap(), None);
        }
        // Empty batches never reach the server.
        store.delete(&[]).await.unwrap();
        store.multi_set(&[], Duration::from_secs(30)).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // requires Redis
    async fn delete_if_keeps_key_when_guard_changed() {
        let store = store().await;
        let pointer = scoped("guard-ptr");
        let record = scoped("guard-rec");
        store.set_with_ttl(&pointer, b"1", Duration::from_secs(30)).await.unwrap();
        store.set_with_ttl(&record, b"v2", Duration::from_secs(30)).await.unwrap();

        let expected = [(pointer.as_str(), Some(&b"1"[..])), (record.as_str(), None)];
        assert!(!store.delete_if(&pointer, &expected).await.unwrap());
        assert!(store.get(&pointer).await.unwrap().is_some());

        let expected = [(pointer.as_str(), Some(&b"1"[..])), (record.as_str(), Some(&b"v2"[..]))];
        assert!(store.delete_if(&pointer, &expected).await.unwrap());
        assert_eq!(store.get(&pointer).await.unwrap(), None);

        store.delete(&[record]).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // requires Redis
    async fn manager_resolves_index_over_redis() {
        let store: Arc<dyn CacheStore> = Arc::new(store().await);
        let config = CacheConfig::default().key_prefix(scoped("mgr"));
        let by_slot = IndexDefinition::new(["slot"]);
        let cache = RedisCacheManager::<Probe>::new(store, config, vec![by_slot.clone()]).unwrap();

        let probe = Probe::new("1", "g", Some("s"));
        cache.set(&probe).await.unwrap();
        assert_eq!(cache.get_by_index(&by_slot, &["s"]).await.unwrap(), Some(probe));

        cache.invalidate("1", None).await.unwrap();
        assert_eq!(cache.get_by_index(&by_slot, &["s"]).await.unwrap(), None);
    }
}
