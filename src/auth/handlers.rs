//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::api::models::ApiResponse;
use crate::auth::models::{LoginPayload, LoginQuery, UserProfile};
use crate::auth::password;
use crate::core::error::{Result, ServiceError};
use crate::db::models::NewUser;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

/// Handler for POST /login - credentials come from the query string
pub async fn login(
    State(state): State<AppState>,
    query: std::result::Result<Query<LoginQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<LoginPayload>>> {
    let Query(credentials) = query.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;

    tracing::info!(username = %credentials.username, "Login attempt");

    let user = match state.users.get_one_by_username(&credentials.username).await {
        Ok(user) => user,
        Err(ServiceError::UserNotFound(_)) => {
            tracing::warn!(username = %credentials.username, "Login for unknown user");
            return Err(ServiceError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    if !password::compare(&credentials.password, &user.password_hash).await? {
        tracing::warn!(username = %credentials.username, "Invalid password");
        return Err(ServiceError::InvalidCredentials);
    }

    let pair = state.tokens.issue_pair(&user.id, &user.user_type)?;

    tracing::info!(user_id = %user.id, username = %user.username, "Login successful");

    Ok(Json(ApiResponse::success(
        LoginPayload {
            user: UserProfile::from(user),
            token: pair.access_token,
            r_token: pair.refresh_token,
        },
        "User Logged In successfully!",
    )))
}

/// Handler for POST /register - forwards the body to the user store
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let Json(new_user) = body.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;

    tracing::info!(username = %new_user.username, "User registration attempt");

    let saved = state.users.add_new(new_user).await?;

    tracing::info!(
        user_id = %saved.id,
        username = %saved.username,
        user_type = %saved.user_type,
        "User registered successfully"
    );

    Ok(Json(ApiResponse::success(
        UserProfile::from(saved),
        "User created successfully!",
    )))
}
