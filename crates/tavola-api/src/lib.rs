//! # tavola-api
//!
//! REST API server built with Axum. Wires the service layer to HTTP:
//! routing, the request guard pipeline, error mapping, and the server
//! lifecycle including background maintenance.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run};
