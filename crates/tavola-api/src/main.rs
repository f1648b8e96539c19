//! Tavola API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p tavola-api
//! ```
//!
//! Configuration is loaded from environment variables; a `.env` file is
//! honored when present.

use tavola_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Tracing comes up after config so the output format can follow the
    // environment; load failures fall back to stderr
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let tracing_config = TracingConfig::for_environment(&config.app.env);
    if let Err(e) = try_init_tracing_with_config(&tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }

    info!(
        env = ?config.app.env,
        backend = ?config.storage.backend,
        port = config.api.port,
        "Configuration loaded"
    );

    if let Err(e) = tavola_api::run(config).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}
