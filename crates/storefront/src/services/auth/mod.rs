//! Authentication coordinator.
//!
//! Validates login and registration input, talks to the store and publishes
//! the outcome of the latest attempt as an [`AuthState`]. A successful login
//! writes the user's id into the shared [`SessionIdentity`].
//!
//! Each attempt moves the state through
//! `Idle -> Validating -> {Success | FieldError | GenericError}`; the caller
//! returns it to `Idle` with [`AuthCoordinator::reset`] once consumed.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use gameverse_core::{Email, UserId, Username};

use crate::db::{RepositoryError, Store};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{NewUser, User};
use crate::session::SessionIdentity;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const USERNAME_NOT_REGISTERED: &str = "username not registered";
pub const INCORRECT_PASSWORD: &str = "incorrect password";
pub const USERNAME_TAKEN: &str = "username already in use";
pub const INVALID_EMAIL: &str = "enter a valid email address";
const GENERIC_FAILURE: &str = "something went wrong, please try again";

/// Phase of the current login or registration attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Idle,
    Validating,
    Success,
    FieldError,
    GenericError,
}

/// Per-field validation or lookup messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl FieldErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.email.is_none()
    }
}

/// Published outcome of the latest attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub login_success: bool,
    pub is_admin: bool,
    pub registration_success: bool,
    pub logged_in_user_id: Option<UserId>,
    /// Message for failures not tied to a field.
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

/// Result of a single login or registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(User),
    /// Input was rejected; nothing changed.
    Rejected(FieldErrors),
    /// The store or hasher failed.
    Failed(String),
}

/// Coordinates login, registration and logout.
#[derive(Clone)]
pub struct AuthCoordinator {
    store: Arc<dyn Store>,
    session: SessionIdentity,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthCoordinator {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, session: SessionIdentity) -> Self {
        Self {
            store,
            session,
            state: Arc::new(watch::Sender::new(AuthState::default())),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Log in with a username and password.
    ///
    /// On success the session identity is set and `is_admin` reflects
    /// whether the reserved admin account logged in.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        self.begin_attempt();

        match self.verify_credentials(username, password).await {
            Ok(user) => {
                self.session.set(Some(user.id));
                set_sentry_user(&user.id, Some(user.username.as_str()));
                info!(user_id = %user.id, "User logged in");

                let is_admin = user.is_admin();
                self.state.send_modify(|s| {
                    s.phase = AuthPhase::Success;
                    s.login_success = true;
                    s.is_admin = is_admin;
                    s.logged_in_user_id = Some(user.id);
                });
                AuthOutcome::Success(user)
            }
            Err(AuthError::UserNotFound) => self.reject(FieldErrors {
                username: Some(USERNAME_NOT_REGISTERED.to_string()),
                ..FieldErrors::default()
            }),
            Err(AuthError::InvalidCredentials) => self.reject(FieldErrors {
                password: Some(INCORRECT_PASSWORD.to_string()),
                ..FieldErrors::default()
            }),
            Err(e) => self.fail(e),
        }
    }

    /// Register a new account.
    ///
    /// Invalid input is rejected without touching the store. The new account
    /// is not logged in.
    #[instrument(skip(self, password, email), fields(username = %username))]
    pub async fn register(&self, username: &str, password: &str, email: &str) -> AuthOutcome {
        self.begin_attempt();

        let (username, email) = match validate_registration(username, password, email) {
            Ok(valid) => valid,
            Err(errors) => return self.reject(errors),
        };

        match self.create_user(username, password, email).await {
            Ok(user) => {
                info!(user_id = %user.id, "User registered");
                self.state.send_modify(|s| {
                    s.phase = AuthPhase::Success;
                    s.registration_success = true;
                });
                AuthOutcome::Success(user)
            }
            Err(AuthError::UserAlreadyExists) => self.reject(FieldErrors {
                username: Some(USERNAME_TAKEN.to_string()),
                ..FieldErrors::default()
            }),
            Err(e) => self.fail(e),
        }
    }

    /// Clear the session identity and reset the state.
    pub fn logout(&self) {
        if self.session.clear() {
            info!("User logged out");
        }
        clear_sentry_user();
        self.reset();
    }

    /// Return the state to its initial value.
    pub fn reset(&self) {
        self.state.send_replace(AuthState::default());
    }

    /// Clear the registration flag only. Idempotent.
    pub fn reset_registration_status(&self) {
        self.state.send_if_modified(|s| {
            let was_set = s.registration_success;
            s.registration_success = false;
            was_set
        });
    }

    fn begin_attempt(&self) {
        self.state.send_modify(|s| {
            s.phase = AuthPhase::Validating;
            s.error = None;
            s.field_errors = FieldErrors::default();
        });
    }

    fn reject(&self, errors: FieldErrors) -> AuthOutcome {
        self.state.send_modify(|s| {
            s.phase = AuthPhase::FieldError;
            s.field_errors = errors.clone();
        });
        AuthOutcome::Rejected(errors)
    }

    fn fail(&self, err: AuthError) -> AuthOutcome {
        warn!(error = %err, "Authentication attempt failed");
        AppError::from(err).capture();
        self.state.send_modify(|s| {
            s.phase = AuthPhase::GenericError;
            s.error = Some(GENERIC_FAILURE.to_string());
        });
        AuthOutcome::Failed(GENERIC_FAILURE.to_string())
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .store
            .credentials(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(password.to_owned(), password_hash).await?;
        Ok(user)
    }

    async fn create_user(
        &self,
        username: Username,
        password: &str,
        email: Email,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password.to_owned()).await?;
        let new_user = NewUser {
            avatar_url: placeholder_avatar(&username),
            full_name: username.to_string(),
            username,
            password_hash,
            email,
            member_since: Utc::now(),
        };

        self.store
            .insert_user(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Check registration input, collecting a message per offending field.
fn validate_registration(
    username: &str,
    password: &str,
    email: &str,
) -> Result<(Username, Email), FieldErrors> {
    let mut errors = FieldErrors::default();

    let username = Username::parse(username)
        .map_err(|e| errors.username = Some(e.to_string()))
        .ok();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.password = Some(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }

    let email = Email::parse(email)
        .map_err(|_| errors.email = Some(INVALID_EMAIL.to_string()))
        .ok();

    match (username, email) {
        (Some(username), Some(email)) if errors.is_empty() => Ok((username, email)),
        _ => Err(errors),
    }
}

/// Generated avatar showing the username's initials.
#[must_use]
pub fn placeholder_avatar(username: &Username) -> String {
    format!(
        "https://placehold.co/300x300/212121/00BCD4?text={}",
        username.initials()
    )
}

/// Hash a password using Argon2id, off the async runtime.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}

/// Verify a password against a hash.
async fn verify_password(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash).map_err(|_| AuthError::InvalidCredentials)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{Database, Table};

    async fn coordinator() -> (AuthCoordinator, Database, SessionIdentity) {
        let db = Database::in_memory().await.unwrap();
        let session = SessionIdentity::new();
        let auth = AuthCoordinator::new(Arc::new(db.clone()), session.clone());
        (auth, db, session)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, db, session) = coordinator().await;

        let outcome = auth.register("gamer", "secret1", "gamer@example.com").await;
        let AuthOutcome::Success(user) = outcome else {
            panic!("registration failed: {outcome:?}");
        };
        assert_eq!(user.full_name, "gamer");
        assert_eq!(
            user.avatar_url,
            "https://placehold.co/300x300/212121/00BCD4?text=GA"
        );
        assert!(auth.state().registration_success);
        assert_eq!(session.get(), None);

        let (_, hash) = db.credentials("gamer").await.unwrap().unwrap();
        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2id$"));

        auth.reset();
        let outcome = auth.login("gamer", "secret1").await;
        assert!(matches!(outcome, AuthOutcome::Success(ref u) if u.id == user.id));

        let state = auth.state();
        assert_eq!(state.phase, AuthPhase::Success);
        assert!(state.login_success);
        assert!(!state.is_admin);
        assert_eq!(state.logged_in_user_id, Some(user.id));
        assert_eq!(session.get(), Some(user.id));
    }

    #[tokio::test]
    async fn test_login_unknown_username() {
        let (auth, _, session) = coordinator().await;

        let outcome = auth.login("nobody", "whatever").await;
        let AuthOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection: {outcome:?}");
        };
        assert_eq!(errors.username.as_deref(), Some(USERNAME_NOT_REGISTERED));
        assert!(errors.password.is_none());
        assert_eq!(auth.state().phase, AuthPhase::FieldError);
        assert_eq!(session.get(), None);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (auth, _, session) = coordinator().await;
        auth.register("gamer", "secret1", "gamer@example.com").await;

        let outcome = auth.login("gamer", "secret2").await;
        let AuthOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection: {outcome:?}");
        };
        assert!(errors.username.is_none());
        assert_eq!(errors.password.as_deref(), Some(INCORRECT_PASSWORD));
        assert!(!auth.state().login_success);
        assert_eq!(session.get(), None);
    }

    #[tokio::test]
    async fn test_admin_login_sets_flag() {
        let (auth, _, _) = coordinator().await;
        auth.register("admin", "admin123", "admin@example.com").await;

        assert!(matches!(
            auth.login("admin", "admin123").await,
            AuthOutcome::Success(_)
        ));
        assert!(auth.state().is_admin);
    }

    #[tokio::test]
    async fn test_invalid_registration_touches_nothing() {
        let (auth, db, _) = coordinator().await;

        let outcome = auth.register("abc", "12345", "not-an-email").await;
        let AuthOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection: {outcome:?}");
        };
        assert_eq!(
            errors.username.as_deref(),
            Some("username must be at least 4 characters")
        );
        assert_eq!(
            errors.password.as_deref(),
            Some("password must be at least 6 characters")
        );
        assert_eq!(errors.email.as_deref(), Some(INVALID_EMAIL));

        assert_eq!(db.changes().revision(Table::Users), 0);
        assert!(db.user_by_username("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_invalid_field() {
        let (auth, db, _) = coordinator().await;

        let outcome = auth.register("gamer", "secret1", "gamer@localhost").await;
        let AuthOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection: {outcome:?}");
        };
        assert!(errors.username.is_none());
        assert!(errors.password.is_none());
        assert!(errors.email.is_some());
        assert_eq!(db.changes().revision(Table::Users), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (auth, _, _) = coordinator().await;
        auth.register("gamer", "secret1", "gamer@example.com").await;

        let outcome = auth.register("gamer", "secret2", "other@example.com").await;
        let AuthOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection: {outcome:?}");
        };
        assert_eq!(errors.username.as_deref(), Some(USERNAME_TAKEN));
        assert!(!auth.state().registration_success);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_state() {
        let (auth, _, session) = coordinator().await;
        auth.register("gamer", "secret1", "gamer@example.com").await;
        auth.login("gamer", "secret1").await;
        assert!(session.get().is_some());

        auth.logout();
        assert_eq!(session.get(), None);
        assert_eq!(auth.state(), AuthState::default());
    }

    #[tokio::test]
    async fn test_reset_registration_status_is_idempotent() {
        let (auth, _, _) = coordinator().await;
        auth.register("gamer", "secret1", "gamer@example.com").await;
        let rx = auth.subscribe();

        auth.reset_registration_status();
        assert!(!auth.state().registration_success);
        assert!(rx.has_changed().unwrap());

        let rx = auth.subscribe();
        auth.reset_registration_status();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Five characters in ten bytes, then six in twelve.
        assert!(validate_registration("gamer", "ñññññ", "g@example.com").is_err());
        assert!(validate_registration("gamer", "ññññññ", "g@example.com").is_ok());
    }
}
