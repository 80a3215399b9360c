//! User Service Library
//!
//! Login and registration endpoints: credential verification against stored
//! bcrypt hashes, issuance of signed session tokens, and account creation
//! through a pluggable user store.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use auth::{TokenConfig, TokenIssuer};
pub use crate::core::{Config, Logger, ServiceError};
pub use db::{DatabaseManager, UserRepository, UserStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
