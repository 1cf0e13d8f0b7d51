use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use zafra_core::config::AppConfig;
use zafra_core::{CommerceService, DialogueEngine, MemorySessionStore, SessionStore};
use zafra_db::{
    connect, migrations, DbPool, SqlCartStore, SqlCatalogGateway, SqlReservationStore,
};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub sessions: Arc<dyn SessionStore>,
    pub engine: Arc<DialogueEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Wire the validated config into a running application: pool, schema,
/// SQL-backed engine, session store.
pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let catalog = Arc::new(SqlCatalogGateway::new(db_pool.clone()));
    let commerce = CommerceService::new(
        catalog.clone(),
        Arc::new(SqlCartStore::new(db_pool.clone())),
        Arc::new(SqlReservationStore::new(db_pool.clone())),
    );
    let engine = Arc::new(DialogueEngine::new(catalog, commerce));

    Ok(Application {
        config,
        db_pool,
        sessions: Arc::new(MemorySessionStore::new()),
        engine,
    })
}
