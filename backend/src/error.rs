//! Error handling for the AgriGoo farm pipeline
//!
//! Every failure leaves the HTTP layer as `{success:false, code, message, error}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::InputError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("Disease detection service error: {0}")]
    DetectionService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            message: message.into(),
            error: error.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DetectionService(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_response_body(&self) -> ErrorResponse {
        match self {
            AppError::Unauthorized(msg) => {
                ErrorResponse::new("UNAUTHORIZED", "Authentication required", msg.clone())
            }
            AppError::Validation { field, message } => {
                ErrorResponse::new("VALIDATION_ERROR", "Invalid request", message.clone())
                    .with_field(field)
            }
            AppError::ValidationError(msg) => {
                ErrorResponse::new("VALIDATION_ERROR", "Invalid request", msg.clone())
            }
            AppError::InvalidInput(errors) => {
                ErrorResponse::new("VALIDATION_ERROR", "Invalid request", errors.to_string())
            }
            AppError::NotFound(resource) => ErrorResponse::new(
                "NOT_FOUND",
                format!("{} not found", resource),
                format!("{} not found", resource),
            ),
            AppError::DetectionService(msg) => ErrorResponse::new(
                "DETECTION_SERVICE_ERROR",
                "Disease detection service error",
                msg.clone(),
            ),
            AppError::Configuration(msg) => {
                ErrorResponse::new("CONFIGURATION_ERROR", "Configuration error", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(self.to_response_body())).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::ValidationError("farmId is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Farm stream".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("missing token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::DetectionService("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Configuration("bad client".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_input_error_keeps_field() {
        let err: AppError = InputError::MissingField { field: "status" }.into();
        let body = serde_json::to_value(err.to_response_body()).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "status");
        assert_eq!(body["error"], "status is required");
    }
}
