//! Catalog inspection and admin edits.
//!
//! # Usage
//!
//! ```bash
//! gameverse-cli products list
//!
//! # Edits require the admin account's password
//! GAMEVERSE_ADMIN_PASSWORD=... gameverse-cli products update 7 --price 125000
//! ```

use std::str::FromStr;

use gameverse_core::{Price, ProductId, Username};
use gameverse_storefront::error::AppError;
use gameverse_storefront::services::AuthOutcome;

use super::{CommandError, open_state};

/// Fields to overwrite; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

/// Print every local product.
///
/// # Errors
///
/// Returns `CommandError` if the store cannot be read.
pub async fn list() -> Result<(), CommandError> {
    let state = open_state().await?;
    let products = state.admin().products().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:>6}  {:>12}  NAME", "ID", "PRICE");
        for product in &products {
            println!("{:>6}  {:>12}  {}", product.id, product.price, product.name);
        }
    }

    tracing::info!(count = products.len(), "Listed products");
    Ok(())
}

/// Log in as the admin account and apply `edit` to product `id`.
///
/// # Errors
///
/// Returns `CommandError::Rejected` if the admin login fails or the price
/// is invalid, and `CommandError::App` if the product does not exist.
pub async fn update(
    id: ProductId,
    edit: ProductEdit,
    admin_password: &str,
) -> Result<(), CommandError> {
    let state = open_state().await?;

    match state.auth().login(Username::ADMIN, admin_password).await {
        AuthOutcome::Success(_) => {}
        AuthOutcome::Rejected(_) => {
            return Err(CommandError::Rejected(
                "admin login failed; check GAMEVERSE_ADMIN_PASSWORD".to_string(),
            ));
        }
        AuthOutcome::Failed(message) => return Err(CommandError::Failed(message)),
    }

    let mut product = state.admin().product(id).await?;

    if let Some(name) = edit.name {
        product.name = name;
    }
    if let Some(description) = edit.description {
        product.description = description;
    }
    if let Some(price) = edit.price {
        product.price = Price::from_str(&price).map_err(AppError::from)?;
    }
    if let Some(image_url) = edit.image_url {
        product.image_url = image_url;
    }

    state.admin().update_product(&product).await?;
    state.auth().logout();

    tracing::info!(product_id = %id, price = %product.price, "Product updated");
    Ok(())
}
