//! User repository for database operations.
//!
//! Password hashes are only read through [`UserRepository::get_password_hash`];
//! every other query returns the hash-free [`User`] domain type.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use gameverse_core::{Email, UserId, Username};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewUser, User};

/// Row shape of the `users` table without the credential column.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    full_name: String,
    email: String,
    member_since: DateTime<Utc>,
    avatar_url: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&r.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            username,
            full_name: r.full_name,
            email,
            member_since: r.member_since,
            avatar_url: r.avatar_url,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, full_name, email, member_since, avatar_url
            FROM users
            WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, full_name, email, member_since, avatar_url
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// Returns `None` if no user has that username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, username, full_name, email, member_since, avatar_url, password_hash
            FROM users
            WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let user = User::try_from(r.user)?;
        Ok(Some((user, r.password_hash)))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO users (username, password_hash, full_name, email, member_since, avatar_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(new_user.username.as_str())
        .bind(new_user.password_hash.as_str())
        .bind(new_user.full_name.as_str())
        .bind(new_user.email.as_str())
        .bind(new_user.member_since)
        .bind(new_user.avatar_url.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username"))?;

        let id = i32::try_from(result.last_insert_rowid()).map_err(|_| {
            RepositoryError::DataCorruption("user id out of range".to_owned())
        })?;

        Ok(User {
            id: UserId::new(id),
            username: new_user.username.clone(),
            full_name: new_user.full_name.clone(),
            email: new_user.email.clone(),
            member_since: new_user.member_since,
            avatar_url: new_user.avatar_url.clone(),
        })
    }

    /// Update a user's profile fields.
    ///
    /// The username, password hash and registration date are not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET full_name = ?2, email = ?3, avatar_url = ?4
            WHERE id = ?1
            ",
        )
        .bind(user.id.as_i32())
        .bind(user.full_name.as_str())
        .bind(user.email.as_str())
        .bind(user.avatar_url.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
