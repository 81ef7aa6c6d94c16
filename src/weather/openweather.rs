//! OpenWeather HTTP client and payload types
//!
//! Covers the three endpoints the service needs: direct geocoding, current
//! conditions and the 5 day / 3 hour forecast. The API key is appended last
//! to every URL so log lines can cut it off.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::models::{Coordinates, GeocodeResult};
use crate::{MausamError, Result};

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// One match from `/geo/1.0/direct`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeocodingEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl From<GeocodingEntry> for GeocodeResult {
    fn from(entry: GeocodingEntry) -> Self {
        GeocodeResult {
            name: entry.name,
            latitude: entry.lat,
            longitude: entry.lon,
            country: entry.country,
            state: entry.state,
        }
    }
}

/// `/data/2.5/weather` response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrentConditions {
    #[serde(default)]
    pub name: Option<String>,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Option<Wind>,
    pub sys: SunCycle,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Wind {
    /// m/s with metric units
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SunCycle {
    pub sunrise: i64,
    pub sunset: i64,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Condition {
    pub description: String,
}

/// `/data/2.5/forecast` response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ForecastSeries {
    #[serde(default)]
    pub city: Option<ForecastCity>,
    #[serde(default)]
    pub list: Vec<ForecastSample>,
}

impl ForecastSeries {
    /// Shift in seconds from UTC, 0 when the provider omitted the city block
    #[must_use]
    pub fn timezone(&self) -> i64 {
        self.city.as_ref().map_or(0, |city| city.timezone)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: i64,
}

/// One 3-hourly forecast step
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ForecastSample {
    /// UTC epoch seconds
    pub dt: i64,
    pub main: SampleReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Option<Wind>,
}

impl ForecastSample {
    #[must_use]
    pub fn wind_speed(&self) -> Option<f64> {
        self.wind.as_ref().and_then(|wind| wind.speed)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SampleReadings {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Weather API client for OpenWeather
pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Mausam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MausamError::config(format!("Failed to create HTTP client: {e}")))?;

        let mut builder = ClientBuilder::new(http);
        if config.max_retries > 0 {
            let policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }

        Ok(Self {
            client: builder.build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            units: config.units.clone(),
        })
    }

    fn coordinate_url(&self, path: &str, coordinates: Coordinates) -> String {
        format!(
            "{}{}?lat={}&lon={}&units={}&appid={}",
            self.base_url,
            path,
            coordinates.latitude,
            coordinates.longitude,
            urlencoding::encode(&self.units),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Issue a GET and decode the JSON body, mapping provider failures
    #[instrument(skip(self, url), fields(url = %url.split("appid=").next().unwrap_or(url)))]
    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start_time = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Network error calling weather provider: {}", e);
            MausamError::api(format!("Network error: {e}"))
        })?;

        let status = response.status();
        let elapsed = start_time.elapsed();
        debug!("HTTP response received: {} in {:.3}s", status, elapsed.as_secs_f64());

        if elapsed > SLOW_RESPONSE {
            warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
        }

        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    error!("Weather provider rejected the API key (HTTP 401)");
                    MausamError::api(format!("Invalid API key: {detail}"))
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!("Weather provider rate limit exceeded (HTTP 429)");
                    MausamError::api(format!("Rate limit exceeded: {detail}"))
                }
                _ => {
                    warn!("Weather provider returned {}: {}", status, detail);
                    MausamError::api(format!(
                        "Request failed with status code {}: {detail}",
                        status.as_u16()
                    ))
                }
            });
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse weather provider response: {}", e);
            MausamError::api(format!("Invalid response from weather provider: {e}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let url = format!(
            "{}/geo/1.0/direct?q={}&limit=1&appid={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        );

        let entries: Vec<GeocodingEntry> = self.fetch(&url).await?;
        if entries.is_empty() {
            warn!("No results found for location '{}'", query);
        } else {
            info!("Found {} geocoding results for '{}'", entries.len(), query);
        }

        Ok(entries.into_iter().map(GeocodeResult::from).collect())
    }

    #[instrument(skip(self))]
    async fn current_conditions(&self, coordinates: Coordinates) -> Result<CurrentConditions> {
        let url = self.coordinate_url("/data/2.5/weather", coordinates);
        self.fetch(&url).await
    }

    #[instrument(skip(self))]
    async fn forecast(&self, coordinates: Coordinates) -> Result<ForecastSeries> {
        let url = self.coordinate_url("/data/2.5/forecast", coordinates);
        let series: ForecastSeries = self.fetch(&url).await?;
        info!("Retrieved forecast with {} samples", series.list.len());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_current_conditions_without_optional_fields() {
        let json = serde_json::json!({
            "main": { "temp": 12.34, "feels_like": 11.0, "humidity": 56 },
            "sys": { "sunrise": 1600000000, "sunset": 1600040000 },
            "weather": [{ "description": "clear sky" }]
        });

        let conditions: CurrentConditions = serde_json::from_value(json).unwrap();
        assert!(conditions.name.is_none());
        assert!(conditions.wind.is_none());
        assert_eq!(conditions.timezone, 0);
        assert_eq!(conditions.main.humidity, 56.0);
    }

    #[test]
    fn test_forecast_timezone_defaults_to_utc() {
        let series: ForecastSeries = serde_json::from_value(serde_json::json!({ "list": [] })).unwrap();
        assert_eq!(series.timezone(), 0);
    }

    #[test]
    fn test_sample_wind_speed() {
        let sample: ForecastSample = serde_json::from_value(serde_json::json!({
            "dt": 1600000000,
            "main": { "temp": 10 },
            "weather": [{ "description": "clouds" }],
            "wind": {}
        }))
        .unwrap();
        assert_eq!(sample.wind_speed(), None);
        assert_eq!(sample.main.temp, 10.0);
    }

    #[test]
    fn test_geocoding_entry_conversion() {
        let entry = GeocodingEntry {
            name: "Manali".to_string(),
            lat: 32.2396,
            lon: 77.1892,
            country: Some("IN".to_string()),
            state: Some("Himachal Pradesh".to_string()),
        };

        let result = GeocodeResult::from(entry);
        assert_eq!(result.latitude, 32.2396);
        assert_eq!(result.label(), "Manali, Himachal Pradesh, IN");
    }
}
