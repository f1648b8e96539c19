//! Error type shared by every service in this crate.

use thiserror::Error;

use tavola_common::AppError;
use tavola_core::DomainError;

/// What a service call can fail with.
///
/// Domain and app errors pass through with their own classification;
/// the remaining variants cover failures that originate in a service
/// itself.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Missing required permission: {permission}")]
    PermissionDenied { permission: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_validation() {
                    400
                } else if e.is_conflict() {
                    409
                } else {
                    500
                }
            }
            Self::App(e) => e.status_code(),
            Self::NotFound { .. } => 404,
            Self::PermissionDenied { .. } => 403,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for the wire envelope
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied { .. } => "INSUFFICIENT_PERMISSION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Seconds until a throttled caller may retry, when the error carries one
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::App(e) => e.retry_after_secs(),
            _ => None,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} {id}"))
            }
            ServiceError::PermissionDenied { permission: _ } => AppError::InsufficientPermission,
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ServiceError::not_found("User", "123");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.to_string().contains("User not found: 123"));
    }

    #[test]
    fn test_permission_denied_error() {
        let err = ServiceError::permission_denied("audit:view");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "INSUFFICIENT_PERMISSION");
    }

    #[test]
    fn test_domain_error_classification() {
        let err: ServiceError = DomainError::ValidationError("bad phone".to_string()).into();
        assert_eq!(err.status_code(), 400);

        let err: ServiceError = DomainError::PhoneAlreadyExists.into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "PHONE_ALREADY_EXISTS");
    }

    #[test]
    fn test_retry_after_passthrough() {
        let err = ServiceError::App(AppError::RateLimited {
            retry_after_secs: 42,
        });
        assert_eq!(err.retry_after_secs(), Some(42));
        assert_eq!(err.status_code(), 429);
    }

    #[test]
    fn test_convert_to_app_error() {
        let service_err = ServiceError::not_found("Session", "456");
        let app_err: AppError = service_err.into();
        assert_eq!(app_err.status_code(), 404);

        let denied: AppError = ServiceError::permission_denied("member:manage").into();
        assert_eq!(denied.status_code(), 403);
    }
}
