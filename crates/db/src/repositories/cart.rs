use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;

use zafra_core::commerce::CartStore;
use zafra_core::domain::cart::{Cart, CartId, CartItem, CartItemId, CartStatus};
use zafra_core::domain::product::ProductId;
use zafra_core::errors::StoreError;

use super::{db_err, decode_err, parse_timestamp, try_get};
use crate::DbPool;

pub struct SqlCartStore {
    pool: DbPool,
}

impl SqlCartStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn items_for_cart(&self, cart_id: &CartId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, cart_id, product_id, quantity FROM cart_items \
             WHERE cart_id = ?1 ORDER BY rowid",
        )
        .bind(&cart_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(item_from_row).collect()
    }
}

#[async_trait]
impl CartStore for SqlCartStore {
    async fn get_or_create_active(&self, address: &str) -> Result<Cart, StoreError> {
        let row = sqlx::query(
            "SELECT id, address, status, created_at FROM carts \
             WHERE address = ?1 AND status = 'active' ORDER BY created_at LIMIT 1",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = row {
            let mut cart = cart_from_row(&row)?;
            cart.items = self.items_for_cart(&cart.id).await?;
            return Ok(cart);
        }

        let cart = Cart::new_active(address);
        sqlx::query("INSERT INTO carts (id, address, status, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&cart.id.0)
            .bind(&cart.address)
            .bind(cart.status.as_str())
            .bind(cart.created_at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(cart)
    }

    async fn find_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query(
            "SELECT id, cart_id, product_id, quantity FROM cart_items \
             WHERE cart_id = ?1 AND product_id = ?2 LIMIT 1",
        )
        .bind(&cart_id.0)
        .bind(&product_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| item_from_row(&row)).transpose()
    }

    async fn insert_item(&self, item: CartItem) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&item.id.0)
        .bind(&item.cart_id.0)
        .bind(&item.product_id.0)
        .bind(item.quantity)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ?1 WHERE id = ?2")
            .bind(quantity)
            .bind(&item_id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(decode_err(format!("cart item `{}` vanished mid-update", item_id.0)));
        }
        Ok(())
    }
}

fn cart_from_row(row: &SqliteRow) -> Result<Cart, StoreError> {
    let status: String = try_get(row, "status")?;
    Ok(Cart {
        id: CartId(try_get(row, "id")?),
        address: try_get(row, "address")?,
        status: CartStatus::parse(&status)
            .ok_or_else(|| decode_err(format!("unknown cart status `{status}`")))?,
        created_at: parse_timestamp(&try_get::<String>(row, "created_at")?)?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &SqliteRow) -> Result<CartItem, StoreError> {
    Ok(CartItem {
        id: CartItemId(try_get(row, "id")?),
        cart_id: CartId(try_get(row, "cart_id")?),
        product_id: ProductId(try_get(row, "product_id")?),
        quantity: try_get(row, "quantity")?,
    })
}

#[cfg(test)]
mod tests {
    use zafra_core::commerce::CartStore;
    use zafra_core::domain::cart::{CartItem, CartItemId, CartStatus};
    use zafra_core::domain::product::ProductId;

    use crate::fixtures::seed_demo;
    use crate::{connect, memory_settings, migrations};

    use super::SqlCartStore;

    async fn store() -> SqlCartStore {
        let pool = connect(&memory_settings()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        seed_demo(&pool).await.expect("seed");
        SqlCartStore::new(pool)
    }

    #[tokio::test]
    async fn active_cart_is_reused_per_address() {
        let store = store().await;

        let first = store.get_or_create_active("5215511112222").await.expect("create");
        let second = store.get_or_create_active("5215511112222").await.expect("reuse");
        let other = store.get_or_create_active("5215533334444").await.expect("create other");

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, CartStatus::Active);
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn items_persist_and_come_back_in_insertion_order() {
        let store = store().await;
        let cart = store.get_or_create_active("5215511112222").await.expect("create");

        for product in ["ZAF001", "ZAF003"] {
            store
                .insert_item(CartItem {
                    id: CartItemId::generate(),
                    cart_id: cart.id.clone(),
                    product_id: ProductId(product.to_string()),
                    quantity: 2,
                })
                .await
                .expect("insert");
        }

        let reloaded = store.get_or_create_active("5215511112222").await.expect("reload");
        let ids: Vec<&str> =
            reloaded.items.iter().map(|item| item.product_id.0.as_str()).collect();
        assert_eq!(ids, vec!["ZAF001", "ZAF003"]);
    }

    #[tokio::test]
    async fn find_item_and_quantity_update() {
        let store = store().await;
        let cart = store.get_or_create_active("5215511112222").await.expect("create");

        let item = CartItem {
            id: CartItemId::generate(),
            cart_id: cart.id.clone(),
            product_id: ProductId("ZAF002".to_string()),
            quantity: 3,
        };
        store.insert_item(item.clone()).await.expect("insert");

        let found = store
            .find_item(&cart.id, &ProductId("ZAF002".to_string()))
            .await
            .expect("query")
            .expect("present");
        assert_eq!(found.quantity, 3);

        store.update_item_quantity(&item.id, 8).await.expect("update");
        let merged = store
            .find_item(&cart.id, &ProductId("ZAF002".to_string()))
            .await
            .expect("query")
            .expect("present");
        assert_eq!(merged.quantity, 8);
    }

    #[tokio::test]
    async fn updating_a_missing_item_is_an_error() {
        let store = store().await;
        let missing = CartItemId::generate();
        assert!(store.update_item_quantity(&missing, 1).await.is_err());
    }
}
