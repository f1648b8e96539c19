//! Server setup and initialization
//!
//! Provides the application builder, backend wiring for both storage
//! backends, and the server runner with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tavola_cache::{
    create_shared_pool, RedisOtpStore, RedisPoolConfig, RedisRateLimitStore, RedisRevocationStore,
};
use tavola_common::{AppConfig, AppError, JwtService, StorageBackend};
use tavola_db::{
    create_pool, PgAuditLogStore, PgSessionStore, PgTokenFamilyStore, PgUserRepository,
};
use tavola_memstore::{
    MemoryAuditLogStore, MemoryOtpStore, MemoryRateLimitStore, MemoryRevocationStore,
    MemorySessionStore, MemoryTokenFamilyStore, MemoryUserRepository,
};
use tavola_service::{ServiceContextBuilder, Sweeper};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::state::{AppState, BackendHandles};

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router(state.clone()).merge(health_routes());
    let router = apply_middleware(router, state.config());
    router.with_state(state)
}

/// Initialize the configured backend and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
        &config.jwt.issuer,
    ));

    let mut builder = ServiceContextBuilder::new()
        .jwt(jwt_service)
        .rate_quotas(config.rate_limit.clone())
        .otp_config(config.otp.clone())
        .session_config(config.session.clone())
        .audit_config(config.audit.clone());

    let backends = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using the in-process storage backend");
            warn!(
                "In-process counters and revocations are not shared; \
                 run a single instance or switch to the external backend"
            );

            builder = builder
                .users(Arc::new(MemoryUserRepository::new()))
                .sessions(Arc::new(MemorySessionStore::new()))
                .families(Arc::new(MemoryTokenFamilyStore::new()))
                .revocations(Arc::new(MemoryRevocationStore::new()))
                .rate_limits(Arc::new(MemoryRateLimitStore::new()))
                .otp_codes(Arc::new(MemoryOtpStore::new()))
                .audit_log(Arc::new(MemoryAuditLogStore::new()));

            BackendHandles::default()
        }
        StorageBackend::External => {
            let database = config
                .database
                .as_ref()
                .ok_or_else(|| AppError::Config("DATABASE_URL is required".to_string()))?;
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::Config("REDIS_URL is required".to_string()))?;

            info!("Connecting to PostgreSQL...");
            let db_config = tavola_db::DatabaseConfig::with_url(
                database.url.clone(),
                database.max_connections,
                database.min_connections,
            );
            let pool = create_pool(&db_config)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!("PostgreSQL connection established");

            info!("Connecting to Redis...");
            let shared_redis = create_shared_pool(RedisPoolConfig::from(redis))
                .map_err(|e| AppError::Cache(e.to_string()))?;
            info!("Redis connection established");

            builder = builder
                .users(Arc::new(PgUserRepository::new(pool.clone())))
                .sessions(Arc::new(PgSessionStore::new(pool.clone())))
                .families(Arc::new(PgTokenFamilyStore::new(pool.clone())))
                .audit_log(Arc::new(PgAuditLogStore::new(pool.clone())))
                .revocations(Arc::new(RedisRevocationStore::new(shared_redis.clone())))
                .rate_limits(Arc::new(RedisRateLimitStore::new(shared_redis.clone())))
                .otp_codes(Arc::new(RedisOtpStore::new(shared_redis.clone())));

            BackendHandles {
                db: Some(pool),
                redis: Some(shared_redis.as_ref().clone()),
            }
        }
    };

    let service_context = builder
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config, backends))
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Run the complete server with configuration.
///
/// Owns the sweeper lifecycle: started before the listener, joined after
/// the listener stops.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));

    let state = create_app_state(config).await?;

    let mut sweeper = Sweeper::new(state.context_handle());
    sweeper.start();

    let app = create_app(state);
    let result = run_server(app, addr).await;

    sweeper.shutdown().await;
    result
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
