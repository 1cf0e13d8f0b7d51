use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;

use zafra_core::catalog::{CatalogGateway, CategoryListing};
use zafra_core::domain::company::Company;
use zafra_core::domain::product::{Category, CategoryId, Product, ProductId};
use zafra_core::domain::reservation::{PresaleProduct, PresaleProductId};
use zafra_core::domain::zone::{DeliveryZone, DeliveryZoneId};
use zafra_core::errors::StoreError;

use super::{db_err, money_from_cents, try_get};
use crate::DbPool;

/// SQLite-backed read-only projections over the catalog tables.
pub struct SqlCatalogGateway {
    pool: DbPool,
}

impl SqlCatalogGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn products_for_category(
        &self,
        category_id: &CategoryId,
        limit: Option<usize>,
        available_only: bool,
    ) -> Result<Vec<Product>, StoreError> {
        let mut sql = String::from(
            "SELECT id, name, category_id, price_cents, stock, unit, available, \
             delivery_days, min_order FROM products WHERE category_id = ?1",
        );
        if available_only {
            sql.push_str(" AND available = 1");
        }
        sql.push_str(" ORDER BY name");
        if limit.is_some() {
            sql.push_str(" LIMIT ?2");
        }

        let mut query = sqlx::query(&sql).bind(&category_id.0);
        if let Some(limit) = limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait]
impl CatalogGateway for SqlCatalogGateway {
    async fn company(&self) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query(
            "SELECT name, description, phone, schedule, address FROM company LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| company_from_row(&row)).transpose()
    }

    async fn category(&self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|row| category_from_row(&row)).transpose()
    }

    async fn categories_with_products(
        &self,
        per_category: Option<usize>,
        available_only: bool,
    ) -> Result<Vec<CategoryListing>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let category = category_from_row(row)?;
            let products = self
                .products_for_category(&category.id, per_category, available_only)
                .await?;
            listings.push(CategoryListing { category, products });
        }
        Ok(listings)
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, category_id, price_cents, stock, unit, available, \
             delivery_days, min_order FROM products WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| product_from_row(&row)).transpose()
    }

    async fn products(&self, limit: Option<usize>) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, category_id, price_cents, stock, unit, available, \
             delivery_days, min_order FROM products ORDER BY id LIMIT ?1",
        )
        .bind(limit.map_or(i64::MAX, |limit| limit as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn available_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, category_id, price_cents, stock, unit, available, \
             delivery_days, min_order FROM products \
             WHERE available = 1 AND stock > 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn count_unavailable_products(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE available = 0 OR stock = 0",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn zones(&self) -> Result<Vec<DeliveryZone>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, zone, days, cost_cents, description FROM delivery_zones ORDER BY days",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(zone_from_row).collect()
    }

    async fn zone_matching(&self, text: &str) -> Result<Option<DeliveryZone>, StoreError> {
        // Matching stays in the domain type so SQL and in-memory lookups
        // agree on the containment semantics.
        Ok(self.zones().await?.into_iter().find(|zone| zone.matches(text)))
    }

    async fn presale_products(&self) -> Result<Vec<PresaleProduct>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, category, price_cents, deposit_cents, release_date, \
             description FROM presale_products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(presale_from_row).collect()
    }

    async fn presale_product(
        &self,
        id: &PresaleProductId,
    ) -> Result<Option<PresaleProduct>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, category, price_cents, deposit_cents, release_date, \
             description FROM presale_products WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| presale_from_row(&row)).transpose()
    }
}

fn company_from_row(row: &SqliteRow) -> Result<Company, StoreError> {
    Ok(Company {
        name: try_get(row, "name")?,
        description: try_get(row, "description")?,
        phone: try_get(row, "phone")?,
        schedule: try_get(row, "schedule")?,
        address: try_get(row, "address")?,
    })
}

fn category_from_row(row: &SqliteRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: CategoryId(try_get(row, "id")?),
        name: try_get(row, "name")?,
        description: try_get(row, "description")?,
    })
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId(try_get(row, "id")?),
        name: try_get(row, "name")?,
        category_id: CategoryId(try_get(row, "category_id")?),
        price: money_from_cents(try_get(row, "price_cents")?),
        stock: try_get(row, "stock")?,
        unit: try_get(row, "unit")?,
        available: try_get(row, "available")?,
        delivery_days: try_get::<i64>(row, "delivery_days")? as u32,
        min_order: try_get::<i64>(row, "min_order")? as u32,
    })
}

fn zone_from_row(row: &SqliteRow) -> Result<DeliveryZone, StoreError> {
    Ok(DeliveryZone {
        id: DeliveryZoneId(try_get(row, "id")?),
        zone: try_get(row, "zone")?,
        days: try_get::<i64>(row, "days")? as u32,
        cost: money_from_cents(try_get(row, "cost_cents")?),
        description: try_get(row, "description")?,
    })
}

fn presale_from_row(row: &SqliteRow) -> Result<PresaleProduct, StoreError> {
    Ok(PresaleProduct {
        id: PresaleProductId(try_get(row, "id")?),
        name: try_get(row, "name")?,
        category: try_get(row, "category")?,
        price: money_from_cents(try_get(row, "price_cents")?),
        deposit: money_from_cents(try_get(row, "deposit_cents")?),
        release_date: try_get(row, "release_date")?,
        description: try_get(row, "description")?,
    })
}
