//! Request origin extractor
//!
//! Collects the client address, user agent, and device fingerprint from
//! request metadata. Used for audit attribution, login rate limit keys,
//! and session binding.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, Extensions, HeaderMap},
};
use tavola_common::fingerprint_from_request;
use tavola_service::RequestOrigin;

/// Header carrying a client-computed device fingerprint
pub const DEVICE_FINGERPRINT_HEADER: &str = "x-device-fingerprint";

/// Where and what the request came from
#[derive(Debug, Clone, Default)]
pub struct ClientOrigin {
    pub origin: RequestOrigin,
    /// Digest of the client's device signals, when any were sent
    pub fingerprint: Option<String>,
}

/// Build a [`ClientOrigin`] from request headers and extensions.
///
/// The address comes from `X-Forwarded-For` when a proxy set it, falling
/// back to the peer address recorded by connect info.
#[must_use]
pub fn client_origin(headers: &HeaderMap, extensions: &Extensions) -> ClientOrigin {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let ip = forwarded.or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let device_header = headers
        .get(DEVICE_FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok());

    let fingerprint =
        fingerprint_from_request(device_header, user_agent.as_deref(), ip.as_deref());

    ClientOrigin {
        origin: RequestOrigin { ip, user_agent },
        fingerprint,
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(client_origin(&parts.headers, &parts.extensions))
    }
}
