use async_trait::async_trait;

use crate::domain::company::Company;
use crate::domain::product::{Category, CategoryId, Product, ProductId};
use crate::domain::reservation::{PresaleProduct, PresaleProductId};
use crate::domain::zone::DeliveryZone;
use crate::errors::StoreError;

/// One category together with a bounded sample of its products, the shape
/// menus and not-found fallbacks render from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryListing {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Read-only projections over the external catalog. All reads are
/// eventually-consistent snapshots; handlers re-read per turn instead of
/// caching across messages.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn company(&self) -> Result<Option<Company>, StoreError>;

    async fn category(&self, id: &CategoryId) -> Result<Option<Category>, StoreError>;

    /// Categories in catalog order, each carrying at most `per_category`
    /// products (all of them when `None`), optionally restricted to
    /// available ones.
    async fn categories_with_products(
        &self,
        per_category: Option<usize>,
        available_only: bool,
    ) -> Result<Vec<CategoryListing>, StoreError>;

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn products(&self, limit: Option<usize>) -> Result<Vec<Product>, StoreError>;

    /// Products with `available = true` and stock on hand.
    async fn available_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Products that are flagged unavailable or have zero stock.
    async fn count_unavailable_products(&self) -> Result<i64, StoreError>;

    async fn zones(&self) -> Result<Vec<DeliveryZone>, StoreError>;

    /// First zone whose name or description contains `text`,
    /// case-insensitively.
    async fn zone_matching(&self, text: &str) -> Result<Option<DeliveryZone>, StoreError>;

    async fn presale_products(&self) -> Result<Vec<PresaleProduct>, StoreError>;

    async fn presale_product(
        &self,
        id: &PresaleProductId,
    ) -> Result<Option<PresaleProduct>, StoreError>;
}
