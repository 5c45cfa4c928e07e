//! User account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the administrator account
//! gameverse-cli users create -u admin -e admin@example.com -p <password>
//! ```
//!
//! Accounts go through the same validation as registration in the shop.

use gameverse_storefront::services::{AuthOutcome, FieldErrors};

use super::{CommandError, open_state};

/// Register a new account.
///
/// # Errors
///
/// Returns `CommandError::Rejected` listing every invalid field, or another
/// `CommandError` if the store fails.
pub async fn create(username: &str, email: &str, password: &str) -> Result<(), CommandError> {
    let state = open_state().await?;
    tracing::info!("Creating user: {username}");

    match state.auth().register(username, password, email).await {
        AuthOutcome::Success(user) => {
            tracing::info!(
                "User created successfully! ID: {}, Username: {}, Admin: {}",
                user.id,
                user.username,
                user.is_admin()
            );
            Ok(())
        }
        AuthOutcome::Rejected(errors) => Err(CommandError::Rejected(describe(&errors))),
        AuthOutcome::Failed(message) => Err(CommandError::Failed(message)),
    }
}

/// Join the field messages into one line.
fn describe(errors: &FieldErrors) -> String {
    [
        ("username", errors.username.as_deref()),
        ("password", errors.password.as_deref()),
        ("email", errors.email.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, message)| message.map(|m| format!("{field}: {m}")))
    .collect::<Vec<_>>()
    .join("; ")
}
