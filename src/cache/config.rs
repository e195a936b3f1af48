//! Cache configuration.

use std::time::Duration;

use super::CacheError;

/// Configuration for one entity cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime shared by the primary record and every index pointer.
    /// There is no indefinite caching, so this must be non-zero.
    pub ttl: Duration,

    /// Upper bound for a single round trip to the cache store.
    pub op_timeout: Duration,

    /// Namespace prepended to every key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            op_timeout: Duration::from_millis(250),
            key_prefix: "gc".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = duration;
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn op_timeout(mut self, duration: Duration) -> Self {
        self.op_timeout = duration;
        self
    }

    /// Set the key namespace.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Check the bounds the engine relies on.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.ttl.as_secs() == 0 {
            return Err(CacheError::InvalidTtl(self.ttl));
        }
        if self.key_prefix.is_empty() || self.key_prefix.contains(':') {
            return Err(CacheError::InvalidConfig(format!(
                "key prefix {:?} must be non-empty and must not contain ':'",
                self.key_prefix
            )));
        }
        Ok(())
    }

    /// Create config for frequently accessed data.
    /// Shorter TTL, read on nearly every message (levels, log routing).
    pub fn hot_data(&self) -> Self {
        Self {
            ttl: Duration::from_secs(60), // 1 minute
            ..self.clone()
        }
    }

    /// Create config for rarely changing data.
    /// Longer TTL (guild configuration).
    pub fn cold_data(&self) -> Self {
        Self {
            ttl: Duration::from_secs(3600), // 1 hour
            ..self.clone()
        }
    }

    /// Create config for lazy-loaded, command-triggered data.
    pub fn lazy_load(&self) -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_rejected() {
        let config = CacheConfig::with_ttl(Duration::from_millis(500));
        assert!(matches!(config.validate(), Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn presets_keep_prefix_and_timeout() {
        let base = CacheConfig::default()
            .key_prefix("bot")
            .op_timeout(Duration::from_millis(50));
        let cold = base.cold_data();
        assert_eq!(cold.key_prefix, "bot");
        assert_eq!(cold.op_timeout, Duration::from_millis(50));
        assert_eq!(cold.ttl, Duration::from_secs(3600));
        assert!(cold.validate().is_ok());
    }

    #[test]
    fn prefix_with_separator_is_rejected() {
        let config = CacheConfig::default().key_prefix("a:b");
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }
}
