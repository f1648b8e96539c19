//! Authorization context extractor
//!
//! The guard middleware validates the bearer token and stores an
//! [`AuthContext`] in the request extensions; this extractor hands it to
//! handlers. It never validates anything itself, so a handler using it on
//! a route outside the guard fails closed with a missing-token error.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tavola_common::AppError;
use tavola_service::AuthContext;

use crate::response::ApiError;

/// Authenticated caller, placed in extensions by the guard middleware
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(Authenticated)
            .ok_or(ApiError::App(AppError::MissingToken))
    }
}
