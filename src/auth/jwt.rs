//! JWT token issuance
//!
//! Access tokens carry `{userId, userType}`. Refresh tokens carry the same
//! identity plus the access token they were issued with, as `token`; clients
//! already holding such refresh tokens depend on that shape.

use crate::core::config::SecurityConfig;
use crate::core::error::{Result, ServiceError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Signing secret and lifetime, fixed for the life of the process
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expires_in: Duration,
}

impl TokenConfig {
    pub fn from_security(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            expires_in: Duration::from_secs(security.token_expires_in),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Claims of an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: String,
    pub user_type: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims of a refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: String,
    pub user_type: String,
    /// The access token issued alongside this refresh token
    pub token: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Access and refresh token issued by one login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs session tokens with the shared HS256 secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: Duration,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expires_in: config.expires_in,
        }
    }

    /// Lifetime applied to every issued token
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issue an access token for a user
    pub fn issue_access_token(&self, user_id: &str, user_type: &str) -> Result<String> {
        let (iat, exp) = self.validity_window()?;

        let claims = AccessClaims {
            user_id: user_id.to_string(),
            user_type: user_type.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims)
    }

    /// Issue a refresh token wrapping an already issued access token
    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        user_type: &str,
        access_token: &str,
    ) -> Result<String> {
        let (iat, exp) = self.validity_window()?;

        let claims = RefreshClaims {
            user_id: user_id.to_string(),
            user_type: user_type.to_string(),
            token: access_token.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims)
    }

    /// Issue an access token, then a refresh token embedding it
    pub fn issue_pair(&self, user_id: &str, user_type: &str) -> Result<TokenPair> {
        let access_token = self.issue_access_token(user_id, user_type)?;
        let refresh_token = self.issue_refresh_token(user_id, user_type, &access_token)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate an access token and extract its claims
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims> {
        self.decode(token)
    }

    /// Validate a refresh token and extract its claims
    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        self.decode(token)
    }

    fn validity_window(&self) -> Result<(i64, i64)> {
        let now = chrono::Utc::now();
        let lifetime = chrono::Duration::from_std(self.expires_in)
            .map_err(|e| ServiceError::TokenError(format!("Invalid token lifetime: {}", e)))?;
        let expiration = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| ServiceError::TokenError("Failed to calculate expiration".to_string()))?;

        Ok((now.timestamp(), expiration.timestamp()))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| ServiceError::TokenError(format!("Failed to generate token: {}", e)))
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        decode::<T>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ServiceError::TokenError(format!("Invalid token: {}", e)))
    }
}
