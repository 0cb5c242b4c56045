// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StorageError;
use crate::validation::FieldFailure;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        failures: Vec<FieldFailure>,
    },
    InvalidJson(String),
    /// Missing record answered with 400 for older clients
    LegacyNotFound(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::LegacyNotFound(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::LegacyNotFound(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, failures } => {
                json!({
                    "error": true,
                    "message": message,
                    "code": self.error_code(),
                    "failures": failures
                })
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::LegacyNotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, failures: Vec<FieldFailure>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            failures,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Not-found error honouring the configured status compatibility flag
    pub fn missing_record(message: impl Into<String>, legacy_status: bool) -> Self {
        if legacy_status {
            ApiError::LegacyNotFound(message.into())
        } else {
            ApiError::NotFound(message.into())
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError. The pipeline has already logged
// the underlying fault.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Constraint(_) => ApiError::conflict("The request conflicts with existing data"),
            StorageError::Unavailable(_) => ApiError::service_unavailable("Database temporarily unavailable"),
            // Don't expose internal SQL errors to clients
            StorageError::Query(_) => ApiError::internal_server_error("An error occurred while processing your request"),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FailureReason;

    #[test]
    fn validation_errors_list_failures() {
        let err = ApiError::validation_error(
            "Validation failed",
            vec![FieldFailure::new("email_address", FailureReason::Required)],
        );
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_json(),
            json!({
                "error": true,
                "message": "Validation failed",
                "code": "VALIDATION_ERROR",
                "failures": [{"field": "email_address", "reason": "required"}]
            })
        );
    }

    #[test]
    fn missing_record_status_follows_flag() {
        assert_eq!(ApiError::missing_record("gone", true).status_code(), 400);
        assert_eq!(ApiError::missing_record("gone", false).status_code(), 404);
        assert_eq!(ApiError::missing_record("gone", true).error_code(), "NOT_FOUND");
    }

    #[test]
    fn storage_errors_map_to_statuses() {
        assert_eq!(ApiError::from(StorageError::Constraint("dup".into())).status_code(), 409);
        assert_eq!(ApiError::from(StorageError::Unavailable("down".into())).status_code(), 503);
        let err = ApiError::from(StorageError::Query("syntax error at $1".into()));
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("syntax"));
    }
}
