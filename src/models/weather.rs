//! Current-weather model and unit formatting

use serde::{Deserialize, Serialize, Serializer};

const MS_TO_KMH: f64 = 3.6;

// Largest magnitude below which every integral f64 is exact as an i64
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Reshaped current conditions for one location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Display label for the location
    pub city: String,
    /// Temperature in Celsius
    #[serde(serialize_with = "serialize_reading")]
    pub temperature: f64,
    /// Apparent temperature in Celsius
    #[serde(serialize_with = "serialize_reading")]
    pub feels_like: f64,
    /// Relative humidity in percent
    #[serde(serialize_with = "serialize_reading")]
    pub humidity: f64,
    /// Wind speed as `"<km/h> Km/hr"`, absent when the provider sent none
    pub wind_speed: Option<String>,
    /// Local sunrise, `H:MM AM|PM`
    pub sunrise: String,
    /// Local sunset, `H:MM AM|PM`
    pub sunset: String,
    /// Offset label, `GMT±HH:MM`
    pub timezone: String,
    /// Local clock at the time the payload was built
    pub local_time: String,
    /// Human-readable conditions
    pub weather: String,
}

/// One entry of a multi-city lookup
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CityWeather {
    Found(CurrentWeather),
    NotFound {
        city: String,
        error: String,
        status: u16,
    },
    Failed {
        city: String,
        error: String,
        details: String,
    },
}

impl CityWeather {
    #[must_use]
    pub fn not_found(city: &str, query: &str) -> Self {
        Self::NotFound {
            city: city.to_string(),
            error: format!(
                "Location not found: {query}. Please check the spelling and try a more specific query (e.g. \"City, State, Country\")"
            ),
            status: 404,
        }
    }

    #[must_use]
    pub fn failed(city: &str, err: &impl std::fmt::Display) -> Self {
        Self::Failed {
            city: city.to_string(),
            error: "City not found or unable to fetch data".to_string(),
            details: err.to_string(),
        }
    }
}

/// Writes whole readings as JSON integers (`71`, not `71.0`), as the provider sends them
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn serialize_reading<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Converts m/s to km/h, rounded to 2 decimals
#[must_use]
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    let kmh = (speed_ms * MS_TO_KMH * 100.0).round() / 100.0;
    // normalise -0.0 so it prints as "0"
    if kmh == 0.0 { 0.0 } else { kmh }
}

/// Renders a wind speed given in m/s as `"<km/h> Km/hr"`
#[must_use]
pub fn format_wind_speed(speed_ms: Option<f64>) -> Option<String> {
    speed_ms.map(|speed| format!("{} Km/hr", ms_to_kmh(speed)))
}
