//! Response types and error handling for API endpoints
//!
//! Provides unified error handling and JSON response formatting.

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tavola_common::AppError;
use tavola_core::DomainError;
use tavola_service::{RateCheck, ServiceError};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// Rate limit response headers
pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    App(#[from] AppError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    #[error("Rate limit exceeded")]
    RateLimited(RateCheck),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::App(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Service(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Domain(e) => {
                if e.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if e.is_validation() {
                    StatusCode::BAD_REQUEST
                } else if e.is_conflict() {
                    StatusCode::CONFLICT
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Validation(_) | Self::InvalidBody(_) | Self::InvalidPath(_) | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::App(e) => e.error_code(),
            Self::Service(e) => e.error_code(),
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::InvalidPath(_) => "INVALID_PATH_PARAMETER",
            Self::InvalidQuery(_) => "INVALID_QUERY_PARAMETER",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Seconds the client should wait before retrying, for 429 responses
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::App(e) => e.retry_after_secs(),
            Self::Service(e) => e.retry_after_secs(),
            Self::RateLimited(check) => Some(check.retry_after_secs()),
            _ => None,
        }
    }

    /// Whether the operation was refused for lack of a confirmation header
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            Self::App(AppError::ConfirmationRequired)
                | Self::Service(ServiceError::App(AppError::ConfirmationRequired))
        )
    }

    /// Verification attempts left, for wrong-code responses
    #[must_use]
    pub fn remaining_attempts(&self) -> Option<u32> {
        match self {
            Self::App(AppError::OtpInvalid { remaining_attempts })
            | Self::Service(ServiceError::App(AppError::OtpInvalid { remaining_attempts })) => {
                Some(*remaining_attempts)
            }
            _ => None,
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// Create an invalid body error
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`; present so clients can branch without status codes
    pub success: bool,
    pub error: ErrorDetail,
}

/// Error detail for API responses
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(rename = "requiresConfirmation", skip_serializing_if = "Option::is_none")]
    pub requires_confirmation: Option<bool>,
    #[serde(rename = "remainingAttempts", skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                retry_after: self.retry_after_secs(),
                requires_confirmation: self.requires_confirmation().then_some(true),
                remaining_attempts: self.remaining_attempts(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log server errors
        if status.is_server_error() {
            error!(error = ?self, "Server error occurred");
        }

        let body = self.body();
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        if let Self::RateLimited(check) = &self {
            apply_rate_limit_headers(response.headers_mut(), check);
        }

        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Build the `X-RateLimit-*` header set for a quota check
#[must_use]
pub fn rate_limit_headers(check: &RateCheck) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    apply_rate_limit_headers(&mut headers, check);
    headers
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, check: &RateCheck) {
    let fields = [
        (RATE_LIMIT_LIMIT, check.limit.to_string()),
        (RATE_LIMIT_REMAINING, check.remaining.to_string()),
        (RATE_LIMIT_RESET, check.reset_at.timestamp().to_string()),
    ];
    for (name, value) in fields {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}

/// Created response (201) with JSON body
pub struct Created<T>(pub T);

impl<T: IntoResponse> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = self.0.into_response();
        *response.status_mut() = StatusCode::CREATED;
        response
    }
}

/// No content response (204)
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// Response from a quota-checked route, carrying `X-RateLimit-*` headers
pub struct Limited<T>(pub RateCheck, pub T);

impl<T: IntoResponse> IntoResponse for Limited<T> {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        apply_rate_limit_headers(response.headers_mut(), &self.0);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn denied_check() -> RateCheck {
        RateCheck {
            allowed: false,
            limit: 5,
            remaining: 0,
            reset_at: Utc::now() + Duration::seconds(30),
        }
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::App(AppError::MissingToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::App(AppError::InsufficientPermission).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::App(AppError::ConfirmationRequired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RateLimited(denied_check()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::invalid_path("bad id").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = ApiError::RateLimited(denied_check()).body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
        assert!(json["error"]["retryAfter"].as_u64().unwrap() >= 1);
        assert!(json["error"].get("requiresConfirmation").is_none());
    }

    #[test]
    fn test_confirmation_required_body() {
        let body = ApiError::App(AppError::ConfirmationRequired).body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "CONFIRMATION_REQUIRED");
        assert_eq!(json["error"]["requiresConfirmation"], serde_json::json!(true));
        assert!(json["error"].get("retryAfter").is_none());
    }

    #[test]
    fn test_otp_invalid_reports_remaining_attempts() {
        let body = ApiError::App(AppError::OtpInvalid {
            remaining_attempts: 2,
        })
        .body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "OTP_INVALID");
        assert_eq!(json["error"]["remainingAttempts"], serde_json::json!(2));
    }

    #[test]
    fn test_rate_limit_headers() {
        let headers = rate_limit_headers(&denied_check());

        assert_eq!(headers.get(RATE_LIMIT_LIMIT).unwrap(), "5");
        assert_eq!(headers.get(RATE_LIMIT_REMAINING).unwrap(), "0");
        assert!(headers.contains_key(RATE_LIMIT_RESET));
    }
}
