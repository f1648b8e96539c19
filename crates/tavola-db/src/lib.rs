//! # tavola-db
//!
//! Database layer implementing the store traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for the persistence traits
//! defined in `tavola-core`. It handles:
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Store implementations, with single-statement atomicity for the
//!   operations that need it (jti rotation, bulk revocation)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavola_db::pool::{create_pool, DatabaseConfig};
//! use tavola_db::PgUserRepository;
//! use tavola_core::traits::UserRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env();
//!     let pool = create_pool(&config).await?;
//!     let users = PgUserRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgAuditLogStore, PgSessionStore, PgTokenFamilyStore, PgUserRepository};
