//! Integration test utilities for the auth service
//!
//! This crate provides helpers for running end-to-end tests against
//! the REST API on the in-process storage backend.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
