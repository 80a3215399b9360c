//! Database models

use serde::{Deserialize, Serialize};

/// Role assigned to accounts created through registration
pub const DEFAULT_USER_TYPE: &str = "user";

/// User record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub user_type: String,
    pub fname: String,
    pub lname: String,
    pub created_at: String,
}

/// Account creation payload as accepted by the store.
///
/// Fields default to empty so the store, not the JSON decoder, decides what a
/// valid record is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    /// Name of the first required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("fname", &self.fname),
            ("lname", &self.lname),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
