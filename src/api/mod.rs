use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::models::{CityWeather, CoordinateQuery, CurrentWeather, ForecastReport};
use crate::service::WeatherService;

pub mod error;

pub use error::{ApiError, ErrorBody};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<WeatherService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    pub cities: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/forecast", get(get_forecast))
        .route("/weather/coords", get(get_weather_by_coordinates))
        .route("/forecast/coords", get(get_forecast_by_coordinates))
        .route("/health", get(health))
        .with_state(state)
}

/// Split the `cities` parameter. Entries are comma separated unless the list
/// uses `;`, in which case each entry may itself be `city, region, country`.
#[must_use]
pub fn split_cities(raw: &str) -> Vec<String> {
    let separator = if raw.contains(';') { ';' } else { ',' };
    raw.split(separator)
        .filter(|city| !city.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_coordinates(query: &CoordinatesQuery) -> Result<CoordinateQuery, ApiError> {
    let present = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let (Some(lat), Some(lon)) = (present(&query.lat), present(&query.lon)) else {
        return Err(ApiError::bad_request("Provide lat and lon query params"));
    };

    CoordinateQuery::parse(&lat, &lon)
        .ok_or_else(|| ApiError::bad_request("lat and lon must be numeric"))
}

async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<Vec<CityWeather>>, ApiError> {
    let cities = query.cities.as_deref().map(split_cities).unwrap_or_default();
    if cities.is_empty() {
        return Err(ApiError::bad_request("Provide cities in query params"));
    }

    state
        .service
        .weather_for_cities(cities)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Multi-city weather lookup failed: {}", e);
            ApiError::internal("Unable to fetch weather data", e)
        })
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ForecastReport>, ApiError> {
    let Some(city) = query.city.filter(|city| !city.trim().is_empty()) else {
        return Err(ApiError::bad_request("Please provide a city in query params"));
    };

    match state.service.forecast_for_city(&city).await {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err(ApiError::not_found("City not found (geocoding)")),
        Err(e) => {
            error!("Forecast for '{}' failed: {}", city, e);
            Err(ApiError::internal("Unable to fetch forecast data", e))
        }
    }
}

async fn get_weather_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<Vec<CurrentWeather>>, ApiError> {
    let requested = parse_coordinates(&query)?;

    state
        .service
        .weather_for_coordinates(&requested)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Weather at {} failed: {}", requested.label, e);
            ApiError::internal("Unable to fetch weather by coordinates", e)
        })
}

async fn get_forecast_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<ForecastReport>, ApiError> {
    let requested = parse_coordinates(&query)?;

    state
        .service
        .forecast_for_coordinates(&requested)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Forecast at {} failed: {}", requested.label, e);
            ApiError::internal("Unable to fetch forecast by coordinates", e)
        })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}
