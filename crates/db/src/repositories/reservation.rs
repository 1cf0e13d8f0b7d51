use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;

use zafra_core::commerce::ReservationStore;
use zafra_core::domain::reservation::{
    PresaleProductId, Reservation, ReservationId, ReservationItem, ReservationItemId,
    ReservationStatus,
};
use zafra_core::errors::StoreError;

use super::{db_err, decode_err, parse_timestamp, try_get};
use crate::DbPool;

pub struct SqlReservationStore {
    pool: DbPool,
}

impl SqlReservationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for SqlReservationStore {
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        // The header and its lines land together or not at all.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO reservations (id, address, status, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&reservation.id.0)
        .bind(&reservation.address)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for item in &reservation.items {
            sqlx::query(
                "INSERT INTO reservation_items (id, reservation_id, presale_product_id, quantity) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&item.id.0)
            .bind(&item.reservation_id.0)
            .bind(&item.presale_product_id.0)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    async fn list_for_address(&self, address: &str) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, address, status, created_at FROM reservations \
             WHERE address = ?1 ORDER BY created_at DESC",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut reservation = reservation_from_row(row)?;
            let item_rows = sqlx::query(
                "SELECT id, reservation_id, presale_product_id, quantity \
                 FROM reservation_items WHERE reservation_id = ?1 ORDER BY rowid",
            )
            .bind(&reservation.id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            reservation.items =
                item_rows.iter().map(item_from_row).collect::<Result<_, _>>()?;
            reservations.push(reservation);
        }
        Ok(reservations)
    }
}

fn reservation_from_row(row: &SqliteRow) -> Result<Reservation, StoreError> {
    let status: String = try_get(row, "status")?;
    Ok(Reservation {
        id: ReservationId(try_get(row, "id")?),
        address: try_get(row, "address")?,
        status: ReservationStatus::parse(&status)
            .ok_or_else(|| decode_err(format!("unknown reservation status `{status}`")))?,
        created_at: parse_timestamp(&try_get::<String>(row, "created_at")?)?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &SqliteRow) -> Result<ReservationItem, StoreError> {
    Ok(ReservationItem {
        id: ReservationItemId(try_get(row, "id")?),
        reservation_id: ReservationId(try_get(row, "reservation_id")?),
        presale_product_id: PresaleProductId(try_get(row, "presale_product_id")?),
        quantity: try_get(row, "quantity")?,
    })
}

#[cfg(test)]
mod tests {
    use zafra_core::commerce::ReservationStore;
    use zafra_core::domain::reservation::{PresaleProductId, Reservation, ReservationStatus};

    use crate::fixtures::seed_demo;
    use crate::{connect, memory_settings, migrations};

    use super::SqlReservationStore;

    async fn store() -> SqlReservationStore {
        let pool = connect(&memory_settings()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        seed_demo(&pool).await.expect("seed");
        SqlReservationStore::new(pool)
    }

    #[tokio::test]
    async fn reservations_round_trip_with_their_lines() {
        let store = store().await;
        let reservation =
            Reservation::pending("5215511112222", PresaleProductId("PRE001".to_string()), 3);
        store.insert(reservation.clone()).await.expect("insert");

        let listed = store.list_for_address("5215511112222").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, reservation.id);
        assert_eq!(listed[0].status, ReservationStatus::Pending);
        assert_eq!(listed[0].items.len(), 1);
        assert_eq!(listed[0].items[0].presale_product_id.0, "PRE001");
        assert_eq!(listed[0].items[0].quantity, 3);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped_to_the_address() {
        let store = store().await;

        let mut older =
            Reservation::pending("5215511112222", PresaleProductId("PRE001".to_string()), 1);
        older.created_at -= chrono::Duration::minutes(5);
        let newer =
            Reservation::pending("5215511112222", PresaleProductId("PRE002".to_string()), 2);
        let foreign =
            Reservation::pending("5215599998888", PresaleProductId("PRE001".to_string()), 1);

        store.insert(older.clone()).await.expect("insert older");
        store.insert(newer.clone()).await.expect("insert newer");
        store.insert(foreign).await.expect("insert foreign");

        let listed = store.list_for_address("5215511112222").await.expect("list");
        let ids: Vec<&str> = listed.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, vec![newer.id.0.as_str(), older.id.0.as_str()]);
    }

    #[tokio::test]
    async fn repeat_requests_never_merge() {
        let store = store().await;
        for _ in 0..2 {
            let reservation =
                Reservation::pending("5215511112222", PresaleProductId("PRE001".to_string()), 1);
            store.insert(reservation).await.expect("insert");
        }

        let listed = store.list_for_address("5215511112222").await.expect("list");
        assert_eq!(listed.len(), 2);
    }
}
