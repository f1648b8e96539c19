//! Axum extractors for request handling
//!
//! Custom extractors for the authorization context, request origin
//! metadata, and validated JSON bodies.

mod auth;
mod origin;
mod validated;

pub use auth::Authenticated;
pub use origin::{client_origin, ClientOrigin, DEVICE_FINGERPRINT_HEADER};
pub use validated::{OptionalValidatedJson, ValidatedJson};
