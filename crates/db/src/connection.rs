//! SQLite pool construction, driven by the `[database]` config section.

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use zafra_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Statements run on every new pooled connection. SQLite ships with foreign
/// keys off; WAL and the busy timeout keep concurrent webhook handlers from
/// tripping over writer locks.
const CONNECTION_PRAGMAS: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "PRAGMA journal_mode = WAL",
    "PRAGMA busy_timeout = 5000",
];

/// Open a pool sized by `settings`. Config validation guarantees a positive
/// connection count and a sane acquire timeout before this is reached.
pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.timeout_secs))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in CONNECTION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}

/// Settings for a throwaway in-memory database. An in-memory SQLite database
/// exists per connection, so the pool is pinned to a single connection; used
/// by tests across the workspace.
pub fn memory_settings() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 30,
    }
}
