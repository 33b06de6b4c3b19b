//! # User Repository
//!
//! Back-office logins. Passwords are stored as argon2 hashes only.

use chrono::Utc;
use parlour_core::validation::{validate_email, validate_name};
use parlour_core::{User, UserRole, ValidationError};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_against_dummy, verify_password};
use crate::repository::new_id;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

const USER_COLUMNS: &str = "id, email, display_name, password_hash, role, created_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Number of users; zero means the next registration bootstraps the
    /// first admin.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
        role: UserRole,
    ) -> DbResult<User> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        validate_name("displayName", display_name)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::OutOfRange {
                field: "password".to_string(),
                min: MIN_PASSWORD_LEN as i64,
                max: 1024,
            }
            .into());
        }

        let id = new_id();
        let password_hash = hash_password(password)?;

        debug!(id = %id, email = %email, role = role.as_str(), "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(display_name.trim())
        .bind(&password_hash)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email.clone()),
            other => other,
        })?;

        info!(id = %id, email = %email, "User created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Case-insensitive lookup by email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Returns the user when the password matches. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            debug!(email = %email, "Login for unknown email");
            verify_against_dummy(password);
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(email = %email, "Login with wrong password");
            Ok(None)
        }
    }
}
