//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod audit;
pub mod auth;
pub mod health;
pub mod members;
pub mod orders;
pub mod otp;
pub mod sessions;
