pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, memory_settings, DbPool};
pub use fixtures::{seed_demo, DemoSeedDataset, SeedSummary, VerificationResult};
pub use repositories::{RepositoryError, SqlCartStore, SqlCatalogGateway, SqlReservationStore};
