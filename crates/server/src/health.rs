//! `GET /health`: readiness probe for the webhook runtime.
//!
//! One catalog count proves the pool, the applied schema and the seed in a
//! single round trip. An empty catalog is still `ready` — the bot degrades
//! to the static menu rather than failing — so only an unreachable database
//! flips the probe to 503.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use zafra_db::DbPool;

#[derive(Clone)]
struct HealthState {
    db_pool: DbPool,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    database: String,
    catalog_products: Option<i64>,
    checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let checked_at = Utc::now().to_rfc3339();

    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db_pool)
        .await
    {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "ready",
                database: "reachable".to_string(),
                catalog_products: Some(count),
                checked_at,
            }),
        ),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthReport {
                status: "degraded",
                database: format!("unreachable: {error}"),
                catalog_products: None,
                checked_at,
            }),
        ),
    }
}
