use chrono::Utc;
use sqlx::Row;

use devisio_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, reference, name, category, description, price_ht, default_vat_rate, active, optionable, upsell";

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let price_raw: String = row.try_get("price_ht").map_err(decode)?;
    let rate_raw: String = row.try_get("default_vat_rate").map_err(decode)?;

    Ok(Product {
        id: ProductId(row.try_get("id").map_err(decode)?),
        reference: row.try_get("reference").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price_ht: price_raw
            .parse()
            .map_err(|_| RepositoryError::Decode(format!("invalid price `{price_raw}`")))?,
        default_vat_rate: rate_raw
            .parse()
            .map_err(|_| RepositoryError::Decode(format!("invalid vat rate `{rate_raw}`")))?,
        active: row.try_get("active").map_err(decode)?,
        optionable: row.try_get("optionable").map_err(decode)?,
        upsell: row.try_get("upsell").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_product(row)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE active = 1 ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_optionable(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE active = 1 AND optionable = 1
             ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_upsell(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE active = 1 AND upsell = 1
             ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO product
                (id, reference, name, category, description, price_ht, default_vat_rate,
                 active, optionable, upsell, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 reference = excluded.reference,
                 name = excluded.name,
                 category = excluded.category,
                 description = excluded.description,
                 price_ht = excluded.price_ht,
                 default_vat_rate = excluded.default_vat_rate,
                 active = excluded.active,
                 optionable = excluded.optionable,
                 upsell = excluded.upsell,
                 updated_at = excluded.updated_at",
        )
        .bind(&product.id.0)
        .bind(&product.reference)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price_ht.to_string())
        .bind(product.default_vat_rate.to_string())
        .bind(product.active)
        .bind(product.optionable)
        .bind(product.upsell)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
