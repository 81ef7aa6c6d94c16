//! Error types and handling for the Mausam weather service

use thiserror::Error;

/// Main error type for the Mausam service
#[derive(Error, Debug)]
pub enum MausamError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl MausamError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MausamError {
    fn from(err: serde_json::Error) -> Self {
        MausamError::cache(err.to_string())
    }
}
