//! HTTP-level tests driving the router against an in-memory provider

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mausam::api::{self, AppState};
use mausam::config::CacheConfig;
use mausam::weather::{CurrentConditions, ForecastSeries};
use mausam::{CacheTtls, Coordinates, GeocodeResult, MausamError, TtlCache, WeatherProvider, WeatherService};
use serde_json::{Value, json};
use tower::ServiceExt;

const JAN_1_2024: i64 = 1_704_067_200;

const PANICKY_LATITUDE: f64 = 10.0;

/// Knows Delhi and Mumbai; `Broken` geocodes but its weather fetch fails and
/// `Panicky` geocodes but its weather fetch panics
#[derive(Default)]
struct FakeProvider {
    geocode_calls: AtomicUsize,
    weather_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    fail_forecast: bool,
    /// Omit place names, as the provider does for open sea or remote points
    nameless: bool,
    /// Forecast sample timestamps too large to shift into local time
    bad_timestamps: bool,
}

impl FakeProvider {
    fn place(name: &str, lat: f64, lon: f64) -> GeocodeResult {
        GeocodeResult {
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            country: Some("IN".to_string()),
            state: None,
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(&self, query: &str) -> mausam::Result<Vec<GeocodeResult>> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match query.to_lowercase().as_str() {
            "delhi" => vec![Self::place("Delhi", 28.6139, 77.209)],
            "mumbai" => vec![Self::place("Mumbai", 19.076, 72.8777)],
            "broken" => vec![Self::place("Broken", -1.0, -1.0)],
            "panicky" => vec![Self::place("Panicky", PANICKY_LATITUDE, 0.0)],
            _ => Vec::new(),
        })
    }

    async fn current_conditions(&self, coordinates: Coordinates) -> mausam::Result<CurrentConditions> {
        self.weather_calls.fetch_add(1, Ordering::SeqCst);
        if coordinates.latitude < 0.0 {
            return Err(MausamError::api("Request failed with status code 503: Service Unavailable"));
        }
        if coordinates.latitude == PANICKY_LATITUDE {
            panic!("provider blew up");
        }

        let name = match (self.nameless, coordinates.latitude > 25.0) {
            (true, _) => "",
            (false, true) => "Delhi",
            (false, false) => "Mumbai",
        };
        Ok(serde_json::from_value(json!({
            "name": name,
            "main": { "temp": 30.5, "feels_like": 33.0, "humidity": 40 },
            "wind": { "speed": 2.5 },
            "sys": { "sunrise": JAN_1_2024 + 5_400, "sunset": JAN_1_2024 + 45_000, "country": "IN" },
            "timezone": 19_800,
            "weather": [{ "description": "haze" }]
        }))
        .unwrap())
    }

    async fn forecast(&self, _coordinates: Coordinates) -> mausam::Result<ForecastSeries> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forecast {
            return Err(MausamError::api("Network error: connection reset"));
        }

        if self.bad_timestamps {
            return Ok(serde_json::from_value(json!({
                "city": { "name": "Delhi", "country": "IN", "timezone": 19_800 },
                "list": [
                    { "dt": i64::MAX - 10, "main": { "temp": 10.0 }, "weather": [{ "description": "mist" }] }
                ]
            }))
            .unwrap());
        }

        let city = if self.nameless {
            json!({ "timezone": 0 })
        } else {
            json!({ "name": "Delhi", "country": "IN", "timezone": 0 })
        };
        Ok(serde_json::from_value(json!({
            "city": city,
            "list": [
                { "dt": JAN_1_2024, "main": { "temp": 10.0 }, "weather": [{ "description": "mist" }], "wind": { "speed": 1.0 } },
                { "dt": JAN_1_2024 + 10_800, "main": { "temp": 14.0 }, "weather": [{ "description": "clear sky" }], "wind": { "speed": 3.0 } },
                { "dt": JAN_1_2024 + 86_400, "main": { "temp": 9.0 }, "weather": [{ "description": "fog" }] }
            ]
        }))
        .unwrap())
    }
}

fn state_with(provider: Arc<FakeProvider>) -> AppState {
    let ttls = CacheTtls::from(&CacheConfig::default());
    let service = WeatherService::new(provider, Arc::new(TtlCache::new()), ttls);
    AppState::new(Arc::new(service))
}

fn app_with(provider: Arc<FakeProvider>) -> axum::Router {
    api::router(state_with(provider))
}

/// The full application stack, including panic recovery
fn full_app_with(provider: Arc<FakeProvider>) -> axum::Router {
    mausam::web::app(state_with(provider), "does-not-exist")
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = get(app, uri).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_weather_requires_cities() {
    let app = app_with(Arc::default());

    for uri in ["/weather", "/weather?cities=", "/weather?cities=,%20,"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "error": "Provide cities in query params" }));
    }
}

#[tokio::test]
async fn test_weather_mixed_results_keep_request_order() {
    let provider = Arc::new(FakeProvider::default());
    let app = app_with(provider.clone());

    let (status, body) = get_json(&app, "/weather?cities=Delhi,Atlantis,Broken").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0]["city"], "Delhi, IN");
    assert_eq!(entries[0]["temperature"], 30.5);
    assert_eq!(entries[0]["wind_speed"], "9 Km/hr");
    assert_eq!(entries[0]["sunrise"], "7:00 AM");
    assert_eq!(entries[0]["timezone"], "GMT+05:30");
    assert_eq!(entries[0]["weather"], "haze");

    assert_eq!(entries[1]["city"], "Atlantis");
    assert_eq!(entries[1]["status"], 404);
    assert!(entries[1]["error"].as_str().unwrap().starts_with("Location not found: Atlantis."));

    assert_eq!(entries[2]["city"], "Broken");
    assert_eq!(entries[2]["error"], "City not found or unable to fetch data");
    assert!(entries[2]["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_geocode_results_are_reused_across_requests() {
    let provider = Arc::new(FakeProvider::default());
    let app = app_with(provider.clone());

    get_json(&app, "/weather?cities=Delhi").await;
    get_json(&app, "/weather?cities=%20%20delhi%20").await;

    assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.weather_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_forecast_requires_city() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/forecast?city=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a city in query params");
}

#[tokio::test]
async fn test_forecast_unknown_city() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/forecast?city=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "City not found (geocoding)" }));
}

#[tokio::test]
async fn test_forecast_groups_samples_by_day() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/forecast?city=Delhi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Delhi");
    assert_eq!(body["country"], "IN");
    assert_eq!(body["timezone"], "GMT+00:00");

    let days = body["forecast"].as_array().unwrap();
    assert_eq!(days.len(), 2);

    assert_eq!(days[0]["date"], "2024-01-01");
    assert_eq!(days[0]["temp_min"], 10.0);
    assert_eq!(days[0]["temp_max"], 14.0);
    assert_eq!(days[0]["weather"], "mist");
    assert_eq!(days[0]["wind_speed"], "7.2 Km/hr");
    assert_eq!(days[0]["sunrise"], "1:30 AM");

    assert_eq!(days[1]["date"], "2024-01-02");
    assert_eq!(days[1]["weather"], "fog");
    assert!(days[1]["wind_speed"].is_null());
}

#[tokio::test]
async fn test_forecast_upstream_failure() {
    let provider = Arc::new(FakeProvider {
        fail_forecast: true,
        ..FakeProvider::default()
    });
    let app = app_with(provider);

    let (status, body) = get_json(&app, "/forecast?city=Delhi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch forecast data");
    assert!(body["details"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_coordinate_params_are_validated() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/weather/coords?lat=28.6").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Provide lat and lon query params");

    let (status, body) = get_json(&app, "/forecast/coords?lat=abc&lon=77").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "lat and lon must be numeric");
}

#[tokio::test]
async fn test_weather_by_coordinates_is_cached() {
    let provider = Arc::new(FakeProvider::default());
    let app = app_with(provider.clone());

    let (status, first) = get(&app, "/weather/coords?lat=28.6139&lon=77.209").await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = get(&app, "/weather/coords?lat=28.61390&lon=77.20900").await;

    assert_eq!(first, second);
    assert_eq!(provider.weather_calls.load(Ordering::SeqCst), 1);

    let body: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["city"], "Delhi, IN");
}

#[tokio::test]
async fn test_weather_by_coordinates_upstream_failure() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/weather/coords?lat=-10&lon=20").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch weather by coordinates");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_forecast_by_coordinates_is_cached() {
    let provider = Arc::new(FakeProvider::default());
    let app = app_with(provider.clone());

    let (status, first) = get(&app, "/forecast/coords?lat=28.6139&lon=77.209").await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = get(&app, "/forecast/coords?lat=28.6139&lon=77.209").await;

    assert_eq!(first, second);
    assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], mausam::VERSION);
}

#[tokio::test]
async fn test_weather_lookup_task_panic_is_500() {
    let app = app_with(Arc::default());

    let (status, body) = get_json(&app, "/weather?cities=Delhi,Panicky").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch weather data");
    assert!(body["details"].as_str().unwrap().contains("City lookup task failed"));
}

#[tokio::test]
async fn test_handler_panic_is_plain_text_500() {
    let app = full_app_with(Arc::default());

    let (status, body) = get(&app, "/weather/coords?lat=10&lon=0").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"Internal Server Error");
}

#[tokio::test]
async fn test_out_of_range_forecast_timestamp_is_json_500() {
    let provider = Arc::new(FakeProvider {
        bad_timestamps: true,
        ..FakeProvider::default()
    });
    let app = full_app_with(provider);

    let (status, body) = get_json(&app, "/forecast/coords?lat=1&lon=2").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch forecast by coordinates");
    assert!(body["details"].as_str().unwrap().contains("invalid timestamp"));
}

#[tokio::test]
async fn test_nameless_place_uses_requested_coordinates() {
    let provider = Arc::new(FakeProvider {
        nameless: true,
        ..FakeProvider::default()
    });
    let app = app_with(provider);

    let (status, body) = get_json(&app, "/weather/coords?lat=28.6100&lon=77.2000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["city"], "28.6100,77.2000");

    let (status, body) = get_json(&app, "/forecast/coords?lat=%2028.6100&lon=77.2000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "28.6100,77.2000");
    assert!(body["country"].is_null());
}

#[tokio::test]
async fn test_whole_readings_serialize_as_integers() {
    let app = app_with(Arc::default());

    let (_, bytes) = get(&app, "/weather/coords?lat=28.6139&lon=77.209").await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains(r#""temperature":30.5,"#), "{text}");
    assert!(text.contains(r#""feels_like":33,"#), "{text}");
    assert!(text.contains(r#""humidity":40,"#), "{text}");

    let (_, bytes) = get(&app, "/forecast?city=Delhi").await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains(r#""temp_min":10,"temp_max":14,"#), "{text}");
}
