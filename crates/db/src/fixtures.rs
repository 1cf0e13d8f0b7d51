use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_PRODUCT_IDS: &[&str] = &["ZAF001", "ZAF002", "ZAF003", "ZAF004", "ZAF005"];
const SEED_CATEGORY_IDS: &[&str] = &["harinas", "levaduras", "grasas"];
const SEED_ZONE_IDS: &[&str] = &["cdmx_centro", "cdmx_sur", "area_metropolitana"];
const SEED_PRESALE_IDS: &[&str] = &["PRE001", "PRE002"];

/// Demo catalog dataset for local runs and repository tests.
///
/// The rows mirror the in-memory fixture the dialogue engine tests use, so a
/// conversation scripted against one backend behaves identically on the other.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Load the demo catalog. Safe to rerun; rows are replaced in place.
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(Self::SQL).await?;
        tx.commit().await?;

        Ok(SeedSummary {
            categories: SEED_CATEGORY_IDS.len(),
            products: SEED_PRODUCT_IDS.len(),
            zones: SEED_ZONE_IDS.len(),
            presales: SEED_PRESALE_IDS.len(),
        })
    }

    /// Verify that every seeded row is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        checks.push((
            "company",
            count_by_ids(pool, "company", &["zafra"]).await? == 1,
        ));
        checks.push((
            "categories",
            count_by_ids(pool, "categories", SEED_CATEGORY_IDS).await?
                == SEED_CATEGORY_IDS.len() as i64,
        ));
        checks.push((
            "products",
            count_by_ids(pool, "products", SEED_PRODUCT_IDS).await?
                == SEED_PRODUCT_IDS.len() as i64,
        ));
        checks.push((
            "delivery-zones",
            count_by_ids(pool, "delivery_zones", SEED_ZONE_IDS).await?
                == SEED_ZONE_IDS.len() as i64,
        ));
        checks.push((
            "presale-products",
            count_by_ids(pool, "presale_products", SEED_PRESALE_IDS).await?
                == SEED_PRESALE_IDS.len() as i64,
        ));

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

/// Shorthand used throughout the repository tests.
pub async fn seed_demo(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    DemoSeedDataset::load(pool).await
}

async fn count_by_ids(pool: &DbPool, table: &str, ids: &[&str]) -> Result<i64, RepositoryError> {
    // Table names and ids come from compile-time constants, never user input.
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    let count =
        sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN ({quoted})"))
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub zones: usize,
    pub presales: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::DemoSeedDataset;
    use crate::{connect, memory_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoSeedDataset::SQL.is_empty());
    }

    #[tokio::test]
    async fn load_is_idempotent_and_verifiable() {
        let pool = connect(&memory_settings()).await.expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoSeedDataset::load(&pool).await.expect("load fixtures");
        assert_eq!(first.products, 5);

        let second = DemoSeedDataset::load(&pool).await.expect("reload fixtures");
        assert_eq!(first, second);

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify fixtures");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn seeded_prices_are_stored_as_cents() {
        let pool = connect(&memory_settings()).await.expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("load fixtures");

        let price_cents: i64 =
            sqlx::query_scalar("SELECT price_cents FROM products WHERE id = 'ZAF001'")
                .fetch_one(&pool)
                .await
                .expect("query price");
        assert_eq!(price_cents, 78_500);
    }
}
