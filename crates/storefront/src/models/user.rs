//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gameverse_core::{Email, UserId, Username};

/// A registered shop user (domain type).
///
/// The password hash never leaves the repository layer on this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// System-assigned user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Display name, initially the username.
    pub full_name: String,
    /// Contact address.
    pub email: Email,
    /// When the account was registered.
    pub member_since: DateTime<Utc>,
    /// Avatar image URL.
    pub avatar_url: String,
}

impl User {
    /// Whether this user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.username.is_admin()
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub full_name: String,
    pub email: Email,
    pub member_since: DateTime<Utc>,
    pub avatar_url: String,
}
