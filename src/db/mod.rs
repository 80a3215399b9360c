//! Database module
//!
//! - SQLite connection pool management
//! - User store trait and repository
//! - Database migrations
//! - Data models

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{NewUser, User};
pub use repository::{UserRepository, UserStore};
