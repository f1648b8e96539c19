//! Error mapping from the Redis layer to domain errors

use std::fmt::Display;

use tavola_core::error::DomainError;

/// Convert any Redis-layer failure to a `DomainError::CacheError`
pub(crate) fn map_cache_error<E: Display>(e: E) -> DomainError {
    DomainError::CacheError(e.to_string())
}
