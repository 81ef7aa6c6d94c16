//! Weather service
//!
//! Composes the location resolver, the upstream provider and the TTL cache
//! into the four lookups the HTTP layer exposes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::cache::TtlCache;
use crate::config::CacheConfig;
use crate::forecast::build_report;
use crate::location_resolver::{LocationResolver, normalize_query};
use crate::models::{CityWeather, CoordinateQuery, Coordinates, CurrentWeather, ForecastReport};
use crate::weather::{WeatherProvider, coordinate_label, reshape_current};
use crate::{MausamError, Result};

/// Lifetimes for the service's cache entries
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub geocode: Duration,
    pub weather: Duration,
    pub forecast: Duration,
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            geocode: Duration::from_secs(config.geocode_ttl_seconds),
            weather: Duration::from_secs(config.weather_ttl_seconds),
            forecast: Duration::from_secs(config.forecast_ttl_seconds),
        }
    }
}

pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<TtlCache>,
    resolver: LocationResolver,
    ttls: CacheTtls,
}

impl WeatherService {
    #[must_use]
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: Arc<TtlCache>, ttls: CacheTtls) -> Self {
        let resolver = LocationResolver::new(provider.clone(), cache.clone(), ttls.geocode);
        Self {
            provider,
            cache,
            resolver,
            ttls,
        }
    }

    /// Current weather for several city queries, looked up concurrently.
    ///
    /// Per-city failures become entries in the result; only a task that dies
    /// outright fails the batch.
    #[instrument(skip(self))]
    pub async fn weather_for_cities(self: &Arc<Self>, cities: Vec<String>) -> Result<Vec<CityWeather>> {
        let handles = cities.into_iter().map(|city| {
            let service = Arc::clone(self);
            tokio::spawn(async move { service.weather_for_city(&city).await })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.map_err(|e| MausamError::general(format!("City lookup task failed: {e}")))
            })
            .collect()
    }

    /// Current weather for one city query; never fails, errors are reported inline
    #[instrument(skip(self))]
    pub async fn weather_for_city(&self, city: &str) -> CityWeather {
        let query = normalize_query(city);

        let geo = match self.resolver.resolve(&query).await {
            Ok(Some(geo)) => geo,
            Ok(None) => {
                warn!("Location not found: {}", query);
                return CityWeather::not_found(city, &query);
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", query, e);
                return CityWeather::failed(city, &e);
            }
        };

        let fetched = self
            .provider
            .current_conditions(geo.coordinates())
            .await
            .and_then(|conditions| reshape_current(&conditions, geo.label(), Utc::now()));

        match fetched {
            Ok(weather) => CityWeather::Found(weather),
            Err(e) => {
                warn!("Weather lookup for '{}' failed: {}", query, e);
                CityWeather::failed(city, &e)
            }
        }
    }

    /// Daily forecast for a city query, `None` when the city cannot be geocoded
    #[instrument(skip(self))]
    pub async fn forecast_for_city(&self, city: &str) -> Result<Option<ForecastReport>> {
        let Some(geo) = self.resolver.resolve(city).await? else {
            return Ok(None);
        };

        let report = self
            .forecast_at(geo.coordinates(), geo.name.clone(), geo.country.clone())
            .await?;
        Ok(Some(report))
    }

    /// Current weather at coordinates as a one-element list, cached
    #[instrument(skip(self, query), fields(at = %query.label))]
    pub async fn weather_for_coordinates(&self, query: &CoordinateQuery) -> Result<Vec<CurrentWeather>> {
        let coordinates = query.coordinates;
        let key = format!("weatherCoords:{}", coordinates.cache_key());
        if let Some(cached) = self.cache.get::<Vec<CurrentWeather>>(&key).await {
            info!("Serving cached weather for {}", coordinates.cache_key());
            return Ok(cached);
        }

        let conditions = self.provider.current_conditions(coordinates).await?;
        let label = coordinate_label(&conditions, &query.label);
        let payload = vec![reshape_current(&conditions, label, Utc::now())?];

        self.cache.put(&key, &payload, self.ttls.weather).await?;
        Ok(payload)
    }

    /// Daily forecast at coordinates, cached
    #[instrument(skip(self, query), fields(at = %query.label))]
    pub async fn forecast_for_coordinates(&self, query: &CoordinateQuery) -> Result<ForecastReport> {
        let coordinates = query.coordinates;
        let key = format!("forecastCoords:{}", coordinates.cache_key());
        if let Some(cached) = self.cache.get::<ForecastReport>(&key).await {
            info!("Serving cached forecast for {}", coordinates.cache_key());
            return Ok(cached);
        }

        let report = self.forecast_at(coordinates, query.label.clone(), None).await?;

        self.cache.put(&key, &report, self.ttls.forecast).await?;
        Ok(report)
    }

    async fn forecast_at(
        &self,
        coordinates: Coordinates,
        fallback_city: String,
        fallback_country: Option<String>,
    ) -> Result<ForecastReport> {
        let (series, current) = tokio::try_join!(
            self.provider.forecast(coordinates),
            self.provider.current_conditions(coordinates)
        )?;

        build_report(&series, &current, fallback_city, fallback_country, Utc::now())
    }
}
