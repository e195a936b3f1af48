//! Configuration module.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cache::CacheConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Redis
    pub redis_url: String,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Base cache settings; per-entity presets derive from these.
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if a required variable is missing or a number does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let ttl_secs: u64 = parse_or("CACHE_TTL_SECS", 300)?;
        let timeout_ms: u64 = parse_or("CACHE_TIMEOUT_MS", 250)?;
        let key_prefix = env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| "gc".to_string());

        let cache = CacheConfig::with_ttl(Duration::from_secs(ttl_secs))
            .op_timeout(Duration::from_millis(timeout_ms))
            .key_prefix(key_prefix);
        cache.validate()?;

        Ok(Self {
            redis_url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
            mongodb_uri: env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
            mongodb_database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "guild_cache".to_string()),
            cache,
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
