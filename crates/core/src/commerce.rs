use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::catalog::CatalogGateway;
use crate::domain::cart::{Cart, CartId, CartItem, CartItemId};
use crate::domain::product::{Category, Product, ProductId};
use crate::domain::reservation::{
    PresaleProduct, PresaleProductId, Reservation, ReservationStatus,
};
use crate::errors::{CommerceError, DomainError, StoreError};

/// Persistence seam for the per-address quotation cart. `get_or_create_active`
/// is find-first, so repeated calls for the same address return the same cart;
/// concurrent first contacts can still race to create two (see DESIGN.md).
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_or_create_active(&self, address: &str) -> Result<Cart, StoreError>;

    async fn find_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, StoreError>;

    async fn insert_item(&self, item: CartItem) -> Result<(), StoreError>;

    async fn update_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError>;

    /// Reservations for an address, newest first.
    async fn list_for_address(&self, address: &str) -> Result<Vec<Reservation>, StoreError>;
}

/// Snapshot returned by a successful cart addition, shaped for the reply.
/// `quantity` is the increment the customer asked for, not the merged line
/// total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartAddition {
    pub product: Product,
    pub category: Option<Category>,
    pub quantity: i64,
}

impl CartAddition {
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLineView {
    pub product: Product,
    pub quantity: i64,
}

impl CartLineView {
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLineView::subtotal).sum()
    }
}

/// Everything the reservation confirmation reply needs. The deposit total is
/// computed here and rendered; it is never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationReceipt {
    pub reservation_id: String,
    pub product: PresaleProduct,
    pub quantity: i64,
}

impl ReservationReceipt {
    pub fn deposit_total(&self) -> Decimal {
        self.product.deposit * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationLineView {
    pub product: PresaleProduct,
    pub quantity: i64,
}

impl ReservationLineView {
    pub fn deposit_total(&self) -> Decimal {
        self.product.deposit * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationView {
    pub short_id: String,
    pub status: ReservationStatus,
    pub lines: Vec<ReservationLineView>,
}

/// Cart and reservation operations on top of the store traits. Stock
/// enforcement is check-then-write against the catalog snapshot read in the
/// same turn; a concurrent stock mutation between the check and the write can
/// oversell (see DESIGN.md).
#[derive(Clone)]
pub struct CommerceService {
    catalog: Arc<dyn CatalogGateway>,
    carts: Arc<dyn CartStore>,
    reservations: Arc<dyn ReservationStore>,
}

impl CommerceService {
    pub fn new(
        catalog: Arc<dyn CatalogGateway>,
        carts: Arc<dyn CartStore>,
        reservations: Arc<dyn ReservationStore>,
    ) -> Self {
        Self { catalog, carts, reservations }
    }

    /// Add `quantity` of a product to the address's active cart. An existing
    /// line for the same product is merged, and the stock check runs against
    /// the combined total.
    pub async fn add_to_cart(
        &self,
        address: &str,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartAddition, CommerceError> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))?;

        if quantity > product.stock {
            return Err(DomainError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: product.stock,
                unit: product.unit.clone(),
            }
            .into());
        }

        let cart = self.carts.get_or_create_active(address).await?;

        match self.carts.find_item(&cart.id, product_id).await? {
            Some(existing) => {
                let merged = existing.quantity + quantity;
                if merged > product.stock {
                    return Err(DomainError::InsufficientStock {
                        product_id: product_id.clone(),
                        requested: merged,
                        available: product.stock,
                        unit: product.unit.clone(),
                    }
                    .into());
                }
                self.carts.update_item_quantity(&existing.id, merged).await?;
            }
            None => {
                self.carts
                    .insert_item(CartItem {
                        id: CartItemId::generate(),
                        cart_id: cart.id.clone(),
                        product_id: product_id.clone(),
                        quantity,
                    })
                    .await?;
            }
        }

        let category = self.catalog.category(&product.category_id).await?;
        Ok(CartAddition { product, category, quantity })
    }

    /// The active cart joined against current product snapshots. Lines whose
    /// product no longer resolves in the catalog are skipped.
    pub async fn view_cart(&self, address: &str) -> Result<CartView, StoreError> {
        let cart = self.carts.get_or_create_active(address).await?;

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            match self.catalog.product(&item.product_id).await? {
                Some(product) => lines.push(CartLineView { product, quantity: item.quantity }),
                None => {
                    tracing::warn!(
                        event_name = "commerce.cart.orphan_line",
                        product_id = %item.product_id,
                        cart_id = %item.cart_id.0,
                        "cart line references a product missing from the catalog"
                    );
                }
            }
        }

        Ok(CartView { lines })
    }

    /// Create a fresh `pending` reservation with a single line. Presale items
    /// are not stock-limited, and prior reservations are never merged.
    pub async fn create_reservation(
        &self,
        address: &str,
        presale_id: &PresaleProductId,
        quantity: i64,
    ) -> Result<ReservationReceipt, CommerceError> {
        let product = self
            .catalog
            .presale_product(presale_id)
            .await?
            .ok_or_else(|| DomainError::PresaleProductNotFound(presale_id.clone()))?;

        let reservation = Reservation::pending(address, presale_id.clone(), quantity);
        let reservation_id = reservation.id.0.clone();
        self.reservations.insert(reservation).await?;

        Ok(ReservationReceipt { reservation_id, product, quantity })
    }

    /// Reservations for an address joined against presale snapshots, newest
    /// first. Lines whose presale product was removed are skipped.
    pub async fn list_reservations(
        &self,
        address: &str,
    ) -> Result<Vec<ReservationView>, StoreError> {
        let reservations = self.reservations.list_for_address(address).await?;

        let mut views = Vec::with_capacity(reservations.len());
        for reservation in &reservations {
            let mut lines = Vec::with_capacity(reservation.items.len());
            for item in &reservation.items {
                match self.catalog.presale_product(&item.presale_product_id).await? {
                    Some(product) => {
                        lines.push(ReservationLineView { product, quantity: item.quantity });
                    }
                    None => {
                        tracing::warn!(
                            event_name = "commerce.reservation.orphan_line",
                            presale_product_id = %item.presale_product_id,
                            reservation_id = %reservation.id.0,
                            "reservation line references a missing presale product"
                        );
                    }
                }
            }
            views.push(ReservationView {
                short_id: reservation.id.short().to_string(),
                status: reservation.status,
                lines,
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use crate::domain::product::ProductId;
    use crate::domain::reservation::{PresaleProductId, ReservationStatus};
    use crate::errors::{CommerceError, DomainError};
    use crate::memory::{demo_catalog, InMemoryCartStore, InMemoryReservationStore};

    use super::CommerceService;

    const ADDRESS: &str = "5215500000001";

    fn service() -> CommerceService {
        CommerceService::new(
            Arc::new(demo_catalog()),
            Arc::new(InMemoryCartStore::default()),
            Arc::new(InMemoryReservationStore::default()),
        )
    }

    #[tokio::test]
    async fn valid_additions_accumulate_per_product() {
        let service = service();
        // ZAF001 has 50 in stock in the demo catalog.
        service.add_to_cart(ADDRESS, &ProductId::parse("zaf001"), 5).await.expect("first add");
        service.add_to_cart(ADDRESS, &ProductId::parse("ZAF001"), 3).await.expect("second add");

        let view = service.view_cart(ADDRESS).await.expect("view cart");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 8);
        assert_eq!(view.total(), view.lines[0].product.price * Decimal::from(8));
    }

    #[tokio::test]
    async fn unknown_product_fails_without_touching_the_cart() {
        let service = service();
        let error = service
            .add_to_cart(ADDRESS, &ProductId::parse("ZAF999"), 1)
            .await
            .expect_err("unknown product");

        assert!(matches!(error, CommerceError::Domain(DomainError::ProductNotFound(_))));
        assert!(service.view_cart(ADDRESS).await.expect("view cart").is_empty());
    }

    #[tokio::test]
    async fn oversized_first_addition_is_rejected() {
        let service = service();
        let error = service
            .add_to_cart(ADDRESS, &ProductId::parse("ZAF001"), 51)
            .await
            .expect_err("over stock");

        match error {
            CommerceError::Domain(DomainError::InsufficientStock {
                requested, available, ..
            }) => {
                assert_eq!(requested, 51);
                assert_eq!(available, 50);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn merge_is_checked_against_the_combined_total() {
        let service = service();
        service.add_to_cart(ADDRESS, &ProductId::parse("ZAF001"), 48).await.expect("first add");

        let error = service
            .add_to_cart(ADDRESS, &ProductId::parse("ZAF001"), 5)
            .await
            .expect_err("combined total exceeds stock");
        match error {
            CommerceError::Domain(DomainError::InsufficientStock { requested, .. }) => {
                assert_eq!(requested, 53, "reported against the combined total");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The failed merge must leave the prior quantity intact.
        let view = service.view_cart(ADDRESS).await.expect("view cart");
        assert_eq!(view.lines[0].quantity, 48);
    }

    #[tokio::test]
    async fn carts_are_scoped_per_address() {
        let service = service();
        service.add_to_cart(ADDRESS, &ProductId::parse("ZAF001"), 2).await.expect("add");

        let other = service.view_cart("5215500000002").await.expect("other cart");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn reservation_creates_a_fresh_pending_record_each_time() {
        let service = service();
        let first = service
            .create_reservation(ADDRESS, &PresaleProductId::parse("PRE001"), 2)
            .await
            .expect("first reservation");
        let second = service
            .create_reservation(ADDRESS, &PresaleProductId::parse("PRE001"), 1)
            .await
            .expect("second reservation");

        assert_ne!(first.reservation_id, second.reservation_id);

        let views = service.list_reservations(ADDRESS).await.expect("list");
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|view| view.status == ReservationStatus::Pending));
        // Newest first.
        assert_eq!(views[0].lines[0].quantity, 1);
        assert_eq!(views[1].lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn deposit_total_is_deposit_times_quantity() {
        let service = service();
        let receipt = service
            .create_reservation(ADDRESS, &PresaleProductId::parse("PRE001"), 3)
            .await
            .expect("reservation");

        assert_eq!(receipt.deposit_total(), receipt.product.deposit * Decimal::from(3));
    }

    #[tokio::test]
    async fn unknown_presale_product_is_rejected() {
        let service = service();
        let error = service
            .create_reservation(ADDRESS, &PresaleProductId::parse("PRE999"), 1)
            .await
            .expect_err("unknown presale");

        assert!(matches!(error, CommerceError::Domain(DomainError::PresaleProductNotFound(_))));
        assert!(service.list_reservations(ADDRESS).await.expect("list").is_empty());
    }
}
