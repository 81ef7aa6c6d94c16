//! Configuration management for the Mausam service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MausamError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the Mausam service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MausamConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for paths no API route matches
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// PEM certificate, only used with the `tls` feature
    #[serde(default)]
    pub tls_cert: Option<PathBuf>,
    /// PEM private key, only used with the `tls` feature
    #[serde(default)]
    pub tls_key: Option<PathBuf>,
}

/// Weather provider configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key
    #[serde(default)]
    pub api_key: String,
    /// Base URL for the provider
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures; 0 disables retrying
    #[serde(default)]
    pub max_retries: u32,
    /// Unit system requested from the provider
    #[serde(default = "default_units")]
    pub units: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Applied when an entry is stored without a TTL
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_seconds: u64,
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_seconds: u64,
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_seconds: u64,
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; spans are only exported when set
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "client/dist".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_geocode_ttl() -> u64 {
    24 * 3600
}

fn default_weather_ttl() -> u64 {
    10 * 60
}

fn default_forecast_ttl() -> u64 {
    30 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: 0,
            units: default_units(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_cache_ttl(),
            geocode_ttl_seconds: default_geocode_ttl(),
            weather_ttl_seconds: default_weather_ttl(),
            forecast_ttl_seconds: default_forecast_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl MausamConfig {
    /// Load configuration from a TOML file (default `mausam.toml`) and
    /// `MAUSAM_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::get_config_path);
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. MAUSAM_WEATHER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("MAUSAM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MausamConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Hosting platforms hand the listener port over in PORT
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Default configuration file, relative to the working directory
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        PathBuf::from("mausam.toml")
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.units.is_empty() {
            self.weather.units = default_units();
        }
        if self.cache.default_ttl_seconds == 0 {
            self.cache.default_ttl_seconds = default_cache_ttl();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the provider API key
    pub fn validate_api_key(&self) -> Result<()> {
        let api_key = self.weather.api_key.trim();
        if api_key.is_empty() {
            return Err(MausamError::config(
                "Weather API key is required. Set weather.api_key or MAUSAM_WEATHER__API_KEY.",
            )
            .into());
        }

        if api_key.len() < 8 {
            return Err(MausamError::config(
                "Weather API key appears to be invalid (too short). Please check your API key.",
            )
            .into());
        }

        if api_key.len() > 100 {
            return Err(MausamError::config(
                "Weather API key appears to be invalid (too long). Please check your API key.",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(MausamError::config("Weather API timeout cannot exceed 300 seconds").into());
        }

        if self.weather.max_retries > 10 {
            return Err(MausamError::config("Weather API max retries cannot exceed 10").into());
        }

        let week = 7 * 24 * 3600;
        let ttls = [
            ("default", self.cache.default_ttl_seconds),
            ("geocode", self.cache.geocode_ttl_seconds),
            ("weather", self.cache.weather_ttl_seconds),
            ("forecast", self.cache.forecast_ttl_seconds),
        ];
        for (name, ttl) in ttls {
            if ttl > week {
                return Err(MausamError::config(format!(
                    "Cache {name} TTL cannot exceed {week} seconds (1 week)"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MausamError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MausamError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(
                MausamError::config("Weather API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(MausamError::config(
                "TLS needs both server.tls_cert and server.tls_key",
            )
            .into());
        }

        Ok(())
    }
}
