//! Authentication module
//!
//! This module provides:
//! - User registration and login handlers
//! - Session token issuance
//! - Password hashing and verification

pub mod handlers;
pub mod jwt;
pub mod models;
pub mod password;

pub use handlers::{login, register};
pub use jwt::{AccessClaims, RefreshClaims, TokenConfig, TokenIssuer, TokenPair};
pub use password::{compare, hash_password, verify_password};
