//! Response types for the VR engine API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    fn internal(error: ApiError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                Self::internal(ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    message,
                ))
            }
            EngineError::InvalidConfig { field, .. } => Self::internal(ApiError::with_details(
                "CONFIG_ERROR",
                format!("Invalid configuration for '{}'", field),
                message,
            )),
            EngineError::InvalidReferenceMonth { .. } => {
                Self::bad_request(ApiError::with_details(
                    "INVALID_REFERENCE_MONTH",
                    message,
                    "reference_month must be between 1 and 12",
                ))
            }
            EngineError::MissingBaseRoster { role } => Self::bad_request(ApiError::with_details(
                "MISSING_BASE_ROSTER",
                message,
                format!("Provide a non-empty '{}' table", role),
            )),
            EngineError::MissingColumn { table, column } => {
                Self::bad_request(ApiError::with_details(
                    "MISSING_COLUMN",
                    message,
                    format!(
                        "None of the headers of '{}' is a known alias of '{}'",
                        table, column
                    ),
                ))
            }
            EngineError::UnresolvedRoles { .. } => {
                Self::bad_request(ApiError::new("UNRESOLVED_ROLES", message))
            }
            EngineError::SourceRead { .. } => {
                Self::bad_request(ApiError::new("SOURCE_READ_ERROR", message))
            }
            EngineError::ReportWrite { .. } => Self::internal(ApiError::with_details(
                "REPORT_ERROR",
                "Report generation failed",
                message,
            )),
        }
    }
}
