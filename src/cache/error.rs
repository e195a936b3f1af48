//! Cache error types.

use std::time::Duration;

use thiserror::Error;

/// Boxed transport-level failure from a cache store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the cache layer.
///
/// Transport failures and timeouts mean the cache is unavailable; callers
/// serve from the authoritative store and skip write-back.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unreachable: {0}")]
    Transport(#[source] BoxError),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to encode cache record for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid index definition for {entity}: {reason}")]
    InvalidIndex { entity: &'static str, reason: String },

    #[error("no index on {fields:?} declared for {entity}")]
    UnknownIndex {
        entity: &'static str,
        fields: Vec<String>,
    },

    #[error("{value:?} is not a valid {entity} {field}")]
    InvalidValue {
        entity: &'static str,
        field: String,
        value: String,
    },

    #[error("cache ttl must be at least one second, got {0:?}")]
    InvalidTtl(Duration),

    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wrap a backend error as a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// True when the remote store could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::transport(err)
    }
}
