//! Entity to model mappers
//!
//! Conversions between domain entities (tavola-core) and database models.
//! Mappers with free-text columns (`role`, `severity`) are fallible.

mod audit_log;
mod session;
mod token_family;
mod user;
