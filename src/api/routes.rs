//! API routes

use crate::api::handlers::AppState;
use crate::auth::handlers::{login, register};
use axum::{routing::post, Router};

/// Auth routes, relative to the configured API prefix
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}
