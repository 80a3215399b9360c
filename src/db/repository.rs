//! User store abstraction and its SQLite implementation

use crate::auth::password::hash_password_async;
use crate::core::error::{Result, ServiceError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{NewUser, User, DEFAULT_USER_TYPE};
use async_trait::async_trait;
use rusqlite::{ffi, OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence boundary for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by username, failing with `UserNotFound` when absent
    async fn get_one_by_username(&self, username: &str) -> Result<User>;

    /// Validate, hash and persist a new account, returning the stored record
    async fn add_new(&self, new_user: NewUser) -> Result<User>;
}

const USER_COLUMNS: &str = "id, username, password_hash, user_type, fname, lname, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        user_type: row.get(3)?,
        fname: row.get(4)?,
        lname: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
    bcrypt_cost: u32,
}

impl UserRepository {
    /// Create a new UserRepository hashing passwords with the given bcrypt cost
    pub fn new(db: Arc<DatabaseManager>, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                [&username],
                map_user,
            ).optional()
            .map_err(ServiceError::DatabaseError)
        }).await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(ServiceError::DatabaseError)
        }).await
    }

    async fn insert(&self, user: User) -> Result<User> {
        self.db.execute(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users \
                 (id, username, password_hash, user_type, fname, lname, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &user.id,
                    &user.username,
                    &user.password_hash,
                    &user.user_type,
                    &user.fname,
                    &user.lname,
                    &user.created_at,
                ],
            );

            match inserted {
                Ok(_) => Ok(user),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Err(ServiceError::DuplicateUsername(user.username))
                }
                Err(e) => Err(ServiceError::DatabaseError(e)),
            }
        }).await
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_one_by_username(&self, username: &str) -> Result<User> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(username.to_string()))
    }

    async fn add_new(&self, new_user: NewUser) -> Result<User> {
        if let Some(field) = new_user.missing_field() {
            return Err(ServiceError::InvalidUserRecord(format!("{} is required", field)));
        }

        // Cheap duplicate check before paying for the hash; the UNIQUE
        // constraint still decides races.
        if self.find_by_username(&new_user.username).await?.is_some() {
            return Err(ServiceError::DuplicateUsername(new_user.username));
        }

        let password_hash = hash_password_async(new_user.password, self.bcrypt_cost).await?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            password_hash,
            user_type: DEFAULT_USER_TYPE.to_string(),
            fname: new_user.fname,
            lname: new_user.lname,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let user = self.insert(user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User record created");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    fn repo() -> UserRepository {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        UserRepository::new(db, 4)
    }

    fn ada() -> NewUser {
        NewUser {
            fname: "Ada".into(),
            lname: "Lovelace".into(),
            username: "ada".into(),
            password: "analytical-engine".into(),
        }
    }

    #[tokio::test]
    async fn test_add_new_hashes_password() {
        let repo = repo();

        let saved = repo.add_new(ada()).await.unwrap();

        assert_eq!(saved.username, "ada");
        assert_eq!(saved.user_type, DEFAULT_USER_TYPE);
        assert_ne!(saved.password_hash, "analytical-engine");
        assert!(verify_password("analytical-engine", &saved.password_hash).unwrap());
        assert!(Uuid::parse_str(&saved.id).is_ok());
    }

    #[tokio::test]
    async fn test_get_one_by_username_roundtrip() {
        let repo = repo();
        let saved = repo.add_new(ada()).await.unwrap();

        let found = repo.get_one_by_username("ada").await.unwrap();

        assert_eq!(found.id, saved.id);
        assert_eq!(found.password_hash, saved.password_hash);
        assert_eq!(found.fname, "Ada");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_one_by_username_missing() {
        let result = repo().get_one_by_username("nobody").await;
        assert!(matches!(result, Err(ServiceError::UserNotFound(name)) if name == "nobody"));
    }

    #[tokio::test]
    async fn test_add_new_rejects_duplicate_username() {
        let repo = repo();
        repo.add_new(ada()).await.unwrap();

        let result = repo.add_new(ada()).await;

        assert!(matches!(result, Err(ServiceError::DuplicateUsername(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_maps_unique_violation() {
        let repo = repo();
        let saved = repo.add_new(ada()).await.unwrap();

        let mut clone = saved.clone();
        clone.id = Uuid::new_v4().to_string();

        let result = repo.insert(clone).await;
        assert!(matches!(result, Err(ServiceError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_insert_keeps_other_constraint_failures() {
        let repo = repo();
        let saved = repo.add_new(ada()).await.unwrap();

        let mut same_id = saved.clone();
        same_id.username = "countess".into();

        let result = repo.insert(same_id).await;
        assert!(matches!(result, Err(ServiceError::DatabaseError(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_new_rejects_incomplete_record() {
        let mut incomplete = ada();
        incomplete.password.clear();

        let result = repo().add_new(incomplete).await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidUserRecord(msg)) if msg.contains("password")
        ));
    }
}
