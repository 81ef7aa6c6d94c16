//! Mausam - weather aggregation service
//!
//! Resolves city names or coordinates, fetches current conditions and
//! 3-hourly forecasts from OpenWeather, reshapes them into a compact
//! unit-normalized JSON format and caches results briefly.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod service;
pub mod time_format;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use cache::TtlCache;
pub use config::MausamConfig;
pub use error::MausamError;
pub use location_resolver::LocationResolver;
pub use models::{
    CityWeather, CoordinateQuery, Coordinates, CurrentWeather, DailyForecast, ForecastReport,
    GeocodeResult,
};
pub use service::{CacheTtls, WeatherService};
pub use weather::{OpenWeatherClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MausamError>;
