//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is shorter than the minimum length.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than the maximum length.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A login name, unique per user.
///
/// Lengths are counted in characters, not bytes.
///
/// ```
/// use gameverse_core::Username;
///
/// assert!(Username::parse("gamer").is_ok());
/// assert!(Username::parse("abc").is_err());
/// assert!(Username::parse("admin").unwrap().is_admin());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 4;

    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 64;

    /// The reserved name that grants the admin role.
    pub const ADMIN: &'static str = "admin";

    /// Parse a `Username`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has fewer than 4 or more than 64
    /// characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let len = s.chars().count();
        if len < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved admin account name.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Up to two leading characters, uppercased, for placeholder avatars.
    #[must_use]
    pub fn initials(&self) -> String {
        self.0.chars().take(2).collect::<String>().to_uppercase()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_length_boundaries() {
        assert!(matches!(
            Username::parse("abc"),
            Err(UsernameError::TooShort { min: 4 })
        ));
        assert!(Username::parse("abcd").is_ok());
        assert!(Username::parse(&"x".repeat(64)).is_ok());
        assert!(matches!(
            Username::parse(&"x".repeat(65)),
            Err(UsernameError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_length_counts_characters() {
        // Four characters, eight bytes.
        assert!(Username::parse("ñañá").is_ok());
    }

    #[test]
    fn test_initials() {
        assert_eq!(Username::parse("gamer").unwrap().initials(), "GA");
        assert_eq!(Username::parse("ñoño").unwrap().initials(), "ÑO");
    }

    #[test]
    fn test_admin_is_exact_match() {
        assert!(Username::parse("admin").unwrap().is_admin());
        assert!(!Username::parse("Admin").unwrap().is_admin());
        assert!(!Username::parse("admin2").unwrap().is_admin());
    }
}
