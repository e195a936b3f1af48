//! Serialized primary record.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{CacheError, CachedEntity};

/// Payload stored at a primary key, with its freshness metadata.
///
/// Index pointers never carry this; they hold only the primary id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord<E> {
    /// Unix timestamp (milliseconds) of the write that produced this copy.
    pub inserted_at: i64,
    pub ttl_secs: u64,
    pub payload: E,
}

impl<E: CachedEntity> CacheRecord<E> {
    pub fn new(payload: E, ttl: Duration) -> Self {
        Self {
            inserted_at: Utc::now().timestamp_millis(),
            ttl_secs: ttl.as_secs(),
            payload,
        }
    }

    pub fn encode(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(self).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Milliseconds since this copy was written.
    pub fn age_ms(&self) -> i64 {
        Utc::now().timestamp_millis() - self.inserted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entity::testing::Probe;

    #[test]
    fn decode_reads_back_payload_and_metadata() {
        let record = CacheRecord::new(Probe::new("7", "g", None), Duration::from_secs(30));
        let bytes = record.encode("k").unwrap();
        let decoded = CacheRecord::<Probe>::decode(&bytes).unwrap();
        assert_eq!(decoded.payload, record.payload);
        assert_eq!(decoded.ttl_secs, 30);
        assert!(decoded.age_ms() >= 0);
    }

    #[test]
    fn schema_mismatch_fails_to_decode() {
        assert!(CacheRecord::<Probe>::decode(br#"{"payload":{"id":1}}"#).is_err());
        assert!(CacheRecord::<Probe>::decode(b"not json").is_err());
    }
}
