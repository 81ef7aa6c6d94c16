//! Daily forecast models

use serde::{Deserialize, Serialize};

use super::weather::serialize_reading;

/// Aggregate of one local calendar day of forecast samples
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    /// Local calendar date, `YYYY-MM-DD`
    pub date: String,
    #[serde(serialize_with = "serialize_reading")]
    pub temp_min: f64,
    #[serde(serialize_with = "serialize_reading")]
    pub temp_max: f64,
    /// Description of the day's first sample
    pub weather: String,
    /// Today's sunrise, repeated on every day
    pub sunrise: String,
    /// Today's sunset, repeated on every day
    pub sunset: String,
    pub local_time: String,
    /// Mean wind over samples that carried wind, as `"<km/h> Km/hr"`
    pub wind_speed: Option<String>,
}

/// Forecast response for one location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastReport {
    pub city: String,
    pub country: Option<String>,
    /// Offset label, `GMT±HH:MM`
    pub timezone: String,
    pub forecast: Vec<DailyForecast>,
}
