//! Authentication request/response models

use crate::db::models::User;
use serde::{Deserialize, Serialize};

/// Placeholder returned in place of a stored password hash
pub const REDACTED_PASSWORD: &str = "************";

/// Login credentials, read from the query string
#[derive(Deserialize)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginQuery")
            .field("username", &self.username)
            .field("password", &REDACTED_PASSWORD)
            .finish()
    }
}

/// User record as returned to clients, password redacted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub password: String,
    pub user_type: String,
    pub fname: String,
    pub lname: String,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password: REDACTED_PASSWORD.to_string(),
            user_type: user.user_type,
            fname: user.fname,
            lname: user.lname,
            created_at: user.created_at,
        }
    }
}

/// Login response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPayload {
    pub user: UserProfile,
    pub token: String,
    #[serde(rename = "rToken")]
    pub r_token: String,
}
