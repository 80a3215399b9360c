//! User Service - authentication backend

use user_service::{api, core, db};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting User Service v{}", user_service::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        api_prefix = %config.server.api_prefix,
        "Server configuration"
    );
    info!(path = ?config.database.path, "Database configuration");

    if config.security.jwt_secret == core::config::DEFAULT_JWT_SECRET {
        tracing::warn!("Using the default JWT secret; set security.jwt_secret before deploying");
    }

    info!("Initializing database...");
    let db = Arc::new(db::DatabaseManager::new(
        &config.database.path,
        config.database.connection_pool_size,
        config.database.busy_timeout(),
    )?);
    info!("Database initialized successfully");

    let server = api::ApiServer::new(&config, db);

    info!(
        url = %format!("http://{}:{}", config.server.host, config.server.port),
        "Server ready - starting to serve requests"
    );

    server.serve().await?;

    Ok(())
}
