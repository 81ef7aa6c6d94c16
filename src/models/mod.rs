//! Data models for the Mausam service
//!
//! This module contains the core domain models organized by concern:
//! - Location: resolved places and coordinate cache keys
//! - Weather: the reshaped current-conditions payload and unit formatting
//! - Forecast: per-day aggregates and the forecast report

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{DailyForecast, ForecastReport};
pub use location::{CoordinateQuery, Coordinates, GeocodeResult};
pub use weather::{CityWeather, CurrentWeather, format_wind_speed};
