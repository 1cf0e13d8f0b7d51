use thiserror::Error;

use zafra_core::errors::StoreError;

pub mod cart;
pub mod catalog;
pub mod reservation;

pub use cart::SqlCartStore;
pub use catalog::SqlCatalogGateway;
pub use reservation::SqlReservationStore;

/// Persistence-layer failure. Crossing back into the core it collapses into
/// `StoreError`, which the dialogue engine treats as upstream-unavailable.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => StoreError::unavailable(source),
            RepositoryError::Decode(message) => StoreError::Decode(message),
        }
    }
}

pub(crate) fn db_err(source: sqlx::Error) -> StoreError {
    RepositoryError::Database(source).into()
}

pub(crate) fn decode_err(message: impl Into<String>) -> StoreError {
    RepositoryError::Decode(message.into()).into()
}

/// Money lives in SQLite as integer cents; the boundary converts to `Decimal`.
pub(crate) fn money_from_cents(cents: i64) -> rust_decimal::Decimal {
    rust_decimal::Decimal::new(cents, 2)
}

pub(crate) fn parse_timestamp(
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&chrono::Utc))
        .map_err(|error| decode_err(format!("invalid timestamp `{raw}`: {error}")))
}

pub(crate) fn try_get<'r, T>(
    row: &'r sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    use sqlx::Row;
    row.try_get::<T, _>(column)
        .map_err(|error| decode_err(format!("column `{column}`: {error}")))
}
