//! JSON error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx JSON response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                details: None,
            },
        }
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_details(mut self, details: impl ToString) -> Self {
        self.body.details = Some(details.to_string());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message).with_details(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_are_omitted_when_absent() {
        let err = ApiError::bad_request("Provide cities in query params");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(&err.body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Provide cities in query params" }));
    }

    #[test]
    fn test_internal_carries_details() {
        let err = ApiError::internal("Unable to fetch forecast data", "API error: timeout");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.details.as_deref(), Some("API error: timeout"));
    }
}
