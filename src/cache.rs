use std::collections::HashMap;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::Result;

/// TTL applied when a caller passes a zero duration.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct StoredEntry {
    value: Value,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Process-lifetime key/value cache with lazy expiry.
///
/// Entries are only dropped when read after their deadline or overwritten;
/// there is no background sweep and no size bound.
pub struct TtlCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
    default_ttl: Duration,
}

impl TtlCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    #[must_use]
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = StoredEntry {
            value: serde_json::to_value(value)?,
            expires_at: Instant::now() + ttl,
        };

        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses, expired entries and entries that no
    /// longer decode into `T`.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => {
                    tracing::debug!("Key not found");
                    return None;
                }
                Some(entry) if entry.is_expired(Instant::now()) => None,
                Some(entry) => Some(entry.value.clone()),
            }
        };

        let Some(value) = value else {
            tracing::debug!("Key found but expired");
            self.evict_if_expired(key).await;
            return None;
        };

        match serde_json::from_value(value) {
            Ok(decoded) => {
                tracing::debug!("Key found and still fresh");
                Some(decoded)
            }
            Err(e) => {
                tracing::warn!("Cached value for {} has unexpected shape: {}", key, e);
                self.remove(key).await;
                None
            }
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Number of entries held, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    // A concurrent put may have refreshed the key between the read and write locks.
    async fn evict_if_expired(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            entries.remove(key);
        }
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}
