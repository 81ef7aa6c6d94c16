//! Location Resolution Module
//!
//! Turns free-text queries such as `"Springfield, IL, US"` into a single
//! geocoded place. Successful lookups are cached; the first provider match
//! always wins.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::Result;
use crate::cache::TtlCache;
use crate::models::GeocodeResult;
use crate::weather::WeatherProvider;

/// Trim each comma-separated part and drop empty ones: `" Paris , ,FR "` → `"Paris,FR"`
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Service for resolving location queries
pub struct LocationResolver {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<TtlCache>,
    ttl: Duration,
}

impl LocationResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: Arc<TtlCache>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    /// Resolve a query to its best match.
    ///
    /// Returns `Ok(None)` for blank queries and for queries the provider
    /// cannot place; provider failures are errors.
    pub async fn resolve(&self, query: &str) -> Result<Option<GeocodeResult>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            debug!("Refusing to geocode blank query {:?}", query);
            return Ok(None);
        }

        let cache_key = format!("geo:{}", normalized.to_lowercase());
        if let Some(cached) = self.cache.get::<GeocodeResult>(&cache_key).await {
            debug!("Geocode cache hit for '{}'", normalized);
            return Ok(Some(cached));
        }

        debug!("Geocoding location name: {}", normalized);
        let Some(result) = self.provider.geocode(&normalized).await?.into_iter().next() else {
            return Ok(None);
        };

        debug!(
            "Found location: {} ({:.4}, {:.4})",
            result.name, result.latitude, result.longitude
        );
        self.cache.put(&cache_key, &result, self.ttl).await?;
        Ok(Some(result))
    }
}
