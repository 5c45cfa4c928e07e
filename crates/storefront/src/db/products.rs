//! Product repository.

use sqlx::SqlitePool;

use gameverse_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::Product;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: String,
    image_url: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = row.price.parse::<Price>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all products ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image_url
            FROM products
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image_url
            FROM products
            WHERE id = ?1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert or replace products by ID in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails; nothing is
    /// committed in that case.
    pub async fn upsert_all(&self, products: &[Product]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for product in products {
            sqlx::query(
                r"
                INSERT INTO products (id, name, description, price, image_url)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    price = excluded.price,
                    image_url = excluded.image_url
                ",
            )
            .bind(product.id.as_i32())
            .bind(product.name.as_str())
            .bind(product.description.as_str())
            .bind(product.price.amount().to_string())
            .bind(product.image_url.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Overwrite an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = ?2, description = ?3, price = ?4, image_url = ?5
            WHERE id = ?1
            ",
        )
        .bind(product.id.as_i32())
        .bind(product.name.as_str())
        .bind(product.description.as_str())
        .bind(product.price.amount().to_string())
        .bind(product.image_url.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count stored products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
