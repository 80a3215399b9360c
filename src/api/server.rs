//! HTTP Server implementation
//!
//! Axum router with the auth routes nested under the configured prefix,
//! request tracing, CORS, request timeouts and graceful shutdown.

use crate::api::handlers::{health_check, AppState};
use crate::api::middleware::{failure_envelope_middleware, route_not_found, trace_id_middleware};
use crate::api::routes::auth_routes;
use crate::auth::jwt::{TokenConfig, TokenIssuer};
use crate::core::config::{Config, ServerConfig};
use crate::db::manager::DatabaseManager;
use crate::db::repository::UserRepository;
use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server backed by the SQLite user store
    pub fn new(config: &Config, db: Arc<DatabaseManager>) -> Self {
        let users = Arc::new(UserRepository::new(db, config.security.bcrypt_cost));
        let tokens = Arc::new(TokenIssuer::new(&TokenConfig::from_security(&config.security)));

        info!(
            expires_in_secs = tokens.expires_in().as_secs(),
            bcrypt_cost = config.security.bcrypt_cost,
            "Token issuer configured"
        );

        Self::with_state(config, AppState { users, tokens })
    }

    /// Create a server around an already assembled application state
    pub fn with_state(config: &Config, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
            config: config.server.clone(),
        }
    }

    fn build_router(config: &Config, state: AppState) -> Router {
        let api_router = Router::new()
            .nest(&config.server.api_prefix, auth_routes())
            .route("/health", get(health_check))
            .fallback(route_not_found)
            .with_state(state);

        api_router.layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(failure_envelope_middleware))
                .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout)))
                .layer(Self::build_cors_layer(&config.security.allowed_origins)),
        )
    }

    /// Build CORS layer from allowed origins configuration
    fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if allowed_origins.iter().any(|origin| origin == "*") {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<_> = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            cors.allow_origin(origins)
        }
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(
            addr = %socket_addr,
            api_prefix = %self.config.api_prefix,
            request_timeout = self.config.request_timeout,
            "HTTP server listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}
