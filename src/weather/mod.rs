use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Coordinates, CurrentWeather, GeocodeResult, format_wind_speed};
use crate::time_format::{format_clock, format_timezone, local_time_at};
use crate::{MausamError, Result};

pub mod openweather;

pub use openweather::{CurrentConditions, ForecastSeries, OpenWeatherClient};

/// Upstream source of geocoding, current conditions and forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Direct geocoding, best match first
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>>;
    async fn current_conditions(&self, coordinates: Coordinates) -> Result<CurrentConditions>;
    /// 3-hourly multi-day forecast
    async fn forecast(&self, coordinates: Coordinates) -> Result<ForecastSeries>;
}

/// Label for a coordinate lookup: `Name, Country`, or the requested
/// `lat,lon` when the provider has no name for the place.
#[must_use]
pub fn coordinate_label(conditions: &CurrentConditions, requested: &str) -> String {
    let name = conditions.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return requested.to_string();
    }

    match conditions.sys.country.as_deref() {
        Some(country) if !country.is_empty() => format!("{name}, {country}"),
        _ => name.to_string(),
    }
}

/// Reshape provider conditions into the public current-weather payload
pub fn reshape_current(
    conditions: &CurrentConditions,
    label: String,
    now: DateTime<Utc>,
) -> Result<CurrentWeather> {
    let description = conditions
        .weather
        .first()
        .map(|condition| condition.description.clone())
        .ok_or_else(|| MausamError::api("Weather provider returned no conditions"))?;

    let offset = conditions.timezone;
    Ok(CurrentWeather {
        city: label,
        temperature: conditions.main.temp,
        feels_like: conditions.main.feels_like,
        humidity: conditions.main.humidity,
        wind_speed: format_wind_speed(conditions.wind.as_ref().and_then(|wind| wind.speed)),
        sunrise: format_clock(conditions.sys.sunrise, offset),
        sunset: format_clock(conditions.sys.sunset, offset),
        timezone: format_timezone(offset),
        local_time: local_time_at(now, offset),
        weather: description,
    })
}
