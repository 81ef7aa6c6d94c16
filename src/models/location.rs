//! Location models for geocoded places and coordinates

use serde::{Deserialize, Serialize};

/// A place resolved by the geocoder
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeocodeResult {
    /// Place name as reported by the provider
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
    /// State or region, when the provider knows one
    pub state: Option<String>,
}

impl GeocodeResult {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Display label `Name, State, Country`, skipping absent parts
    #[must_use]
    pub fn label(&self) -> String {
        let mut label = self.name.clone();
        for part in [&self.state, &self.country].into_iter().flatten() {
            if !part.is_empty() {
                label.push_str(", ");
                label.push_str(part);
            }
        }
        label
    }
}

/// A latitude/longitude pair
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinates rounded to 4 decimals, used to build cache keys
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates from a request, keeping the caller's spelling of them
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateQuery {
    pub coordinates: Coordinates,
    /// `lat,lon` exactly as requested (trimmed), e.g. `28.6100,77.2000`
    pub label: String,
}

impl CoordinateQuery {
    /// Parse trimmed `lat`/`lon` strings; `None` unless both are finite numbers
    #[must_use]
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let (lat, lon) = (lat.trim(), lon.trim());
        let latitude = lat.parse::<f64>().ok().filter(|v| v.is_finite())?;
        let longitude = lon.parse::<f64>().ok().filter(|v| v.is_finite())?;

        Some(Self {
            coordinates: Coordinates::new(latitude, longitude),
            label: format!("{lat},{lon}"),
        })
    }
}
