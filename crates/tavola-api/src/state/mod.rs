//! Application state
//!
//! Holds the shared state for the Axum application including
//! the service context, backend handles, and configuration.

use std::sync::Arc;

use tavola_cache::RedisPool;
use tavola_common::AppConfig;
use tavola_db::PgPool;
use tavola_service::ServiceContext;

/// Connection handles kept for readiness probes.
///
/// Both are `None` on the in-process backend, which has no external
/// dependencies to probe.
#[derive(Clone, Default)]
pub struct BackendHandles {
    pub db: Option<PgPool>,
    pub redis: Option<RedisPool>,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    /// Application configuration
    config: Arc<AppConfig>,
    /// Raw backend connections, for health checks only
    backends: BackendHandles,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service_context: ServiceContext,
        config: AppConfig,
        backends: BackendHandles,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
            backends,
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get a shared handle to the service context, for the sweeper
    pub fn context_handle(&self) -> Arc<ServiceContext> {
        Arc::clone(&self.service_context)
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the backend connection handles
    pub fn backends(&self) -> &BackendHandles {
        &self.backends
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .finish()
    }
}
