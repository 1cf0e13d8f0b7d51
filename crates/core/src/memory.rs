//! In-memory implementations of the store traits, used by the engine tests
//! and as lightweight doubles anywhere a database is overkill.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::catalog::{CatalogGateway, CategoryListing};
use crate::commerce::{CartStore, ReservationStore};
use crate::domain::cart::{Cart, CartId, CartItem, CartItemId, CartStatus};
use crate::domain::company::Company;
use crate::domain::product::{Category, CategoryId, Product, ProductId};
use crate::domain::reservation::{PresaleProduct, PresaleProductId, Reservation};
use crate::domain::zone::{DeliveryZone, DeliveryZoneId};
use crate::errors::StoreError;

/// Catalog snapshot held in process. `set_failing(true)` makes every read
/// return `StoreError::Unavailable`, which is how the upstream-failure paths
/// are exercised in tests.
#[derive(Default)]
pub struct InMemoryCatalog {
    pub company: Option<Company>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub zones: Vec<DeliveryZone>,
    pub presales: Vec<PresaleProduct>,
    failing: AtomicBool,
}

impl InMemoryCatalog {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory catalog marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn company(&self) -> Result<Option<Company>, StoreError> {
        self.guard()?;
        Ok(self.company.clone())
    }

    async fn category(&self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        self.guard()?;
        Ok(self.categories.iter().find(|category| &category.id == id).cloned())
    }

    async fn categories_with_products(
        &self,
        per_category: Option<usize>,
        available_only: bool,
    ) -> Result<Vec<CategoryListing>, StoreError> {
        self.guard()?;
        Ok(self
            .categories
            .iter()
            .map(|category| {
                let products = self
                    .products
                    .iter()
                    .filter(|product| product.category_id == category.id)
                    .filter(|product| !available_only || product.available)
                    .take(per_category.unwrap_or(usize::MAX))
                    .cloned()
                    .collect();
                CategoryListing { category: category.clone(), products }
            })
            .collect())
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        self.guard()?;
        Ok(self.products.iter().find(|product| &product.id == id).cloned())
    }

    async fn products(&self, limit: Option<usize>) -> Result<Vec<Product>, StoreError> {
        self.guard()?;
        Ok(self.products.iter().take(limit.unwrap_or(usize::MAX)).cloned().collect())
    }

    async fn available_products(&self) -> Result<Vec<Product>, StoreError> {
        self.guard()?;
        Ok(self.products.iter().filter(|product| product.in_stock()).cloned().collect())
    }

    async fn count_unavailable_products(&self) -> Result<i64, StoreError> {
        self.guard()?;
        Ok(self.products.iter().filter(|product| !product.in_stock()).count() as i64)
    }

    async fn zones(&self) -> Result<Vec<DeliveryZone>, StoreError> {
        self.guard()?;
        Ok(self.zones.clone())
    }

    async fn zone_matching(&self, text: &str) -> Result<Option<DeliveryZone>, StoreError> {
        self.guard()?;
        Ok(self.zones.iter().find(|zone| zone.matches(text)).cloned())
    }

    async fn presale_products(&self) -> Result<Vec<PresaleProduct>, StoreError> {
        self.guard()?;
        Ok(self.presales.clone())
    }

    async fn presale_product(
        &self,
        id: &PresaleProductId,
    ) -> Result<Option<PresaleProduct>, StoreError> {
        self.guard()?;
        Ok(self.presales.iter().find(|presale| &presale.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<Vec<Cart>>,
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_or_create_active(&self, address: &str) -> Result<Cart, StoreError> {
        {
            let carts = self.carts.read().await;
            if let Some(cart) = carts
                .iter()
                .find(|cart| cart.address == address && cart.status == CartStatus::Active)
            {
                return Ok(cart.clone());
            }
        }

        let mut carts = self.carts.write().await;
        // Re-check under the write lock before creating.
        if let Some(cart) =
            carts.iter().find(|cart| cart.address == address && cart.status == CartStatus::Active)
        {
            return Ok(cart.clone());
        }
        let cart = Cart::new_active(address);
        carts.push(cart.clone());
        Ok(cart)
    }

    async fn find_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, StoreError> {
        let carts = self.carts.read().await;
        Ok(carts
            .iter()
            .find(|cart| &cart.id == cart_id)
            .and_then(|cart| cart.items.iter().find(|item| &item.product_id == product_id))
            .cloned())
    }

    async fn insert_item(&self, item: CartItem) -> Result<(), StoreError> {
        let mut carts = self.carts.write().await;
        let cart = carts
            .iter_mut()
            .find(|cart| cart.id == item.cart_id)
            .ok_or_else(|| StoreError::decode(format!("no cart with id `{}`", item.cart_id.0)))?;
        cart.items.push(item);
        Ok(())
    }

    async fn update_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let mut carts = self.carts.write().await;
        for cart in carts.iter_mut() {
            if let Some(item) = cart.items.iter_mut().find(|item| &item.id == item_id) {
                item.quantity = quantity;
                return Ok(());
            }
        }
        Err(StoreError::decode(format!("no cart item with id `{}`", item_id.0)))
    }
}

#[derive(Default)]
pub struct InMemoryReservationStore {
    reservations: RwLock<Vec<Reservation>>,
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        self.reservations.write().await.push(reservation);
        Ok(())
    }

    async fn list_for_address(&self, address: &str) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .iter()
            .filter(|reservation| reservation.address == address)
            .rev()
            .cloned()
            .collect())
    }
}

/// Small bakery-supply catalog used across the engine and commerce tests.
pub fn demo_catalog() -> InMemoryCatalog {
    let harinas = CategoryId("harinas".to_string());
    let levaduras = CategoryId("levaduras".to_string());
    let grasas = CategoryId("grasas".to_string());

    InMemoryCatalog {
        company: Some(Company {
            name: "Zafra".to_string(),
            description: Some(
                "Insumos para panadería y repostería con más de 30 años de experiencia"
                    .to_string(),
            ),
            phone: "55 6805 9501".to_string(),
            schedule: "Lunes a Viernes: 9:00 am - 6:00 pm".to_string(),
            address: "Avenida Central de Abastos, 09040 Ciudad de México".to_string(),
        }),
        categories: vec![
            Category {
                id: harinas.clone(),
                name: "Harinas".to_string(),
                description: Some("Harinas de trigo y especiales".to_string()),
            },
            Category {
                id: levaduras.clone(),
                name: "Levaduras y Mejorantes".to_string(),
                description: None,
            },
            Category {
                id: grasas.clone(),
                name: "Grasas y Margarinas".to_string(),
                description: None,
            },
        ],
        products: vec![
            Product {
                id: ProductId("ZAF001".to_string()),
                name: "Harina de Trigo 44kg".to_string(),
                category_id: harinas.clone(),
                price: Decimal::new(78_500, 2),
                stock: 50,
                unit: "bulto".to_string(),
                available: true,
                delivery_days: 1,
                min_order: 1,
            },
            Product {
                id: ProductId("ZAF002".to_string()),
                name: "Harina Integral 22kg".to_string(),
                category_id: harinas,
                price: Decimal::new(43_000, 2),
                stock: 18,
                unit: "bulto".to_string(),
                available: true,
                delivery_days: 1,
                min_order: 1,
            },
            Product {
                id: ProductId("ZAF003".to_string()),
                name: "Levadura Fresca 1kg".to_string(),
                category_id: levaduras.clone(),
                price: Decimal::new(9_500, 2),
                stock: 8,
                unit: "caja".to_string(),
                available: true,
                delivery_days: 2,
                min_order: 1,
            },
            Product {
                id: ProductId("ZAF004".to_string()),
                name: "Mejorante de Masa 10kg".to_string(),
                category_id: levaduras,
                price: Decimal::new(31_000, 2),
                stock: 25,
                unit: "cubeta".to_string(),
                available: true,
                delivery_days: 2,
                min_order: 1,
            },
            Product {
                id: ProductId("ZAF005".to_string()),
                name: "Margarina Multiusos 10kg".to_string(),
                category_id: grasas,
                price: Decimal::new(45_500, 2),
                stock: 0,
                unit: "caja".to_string(),
                available: false,
                delivery_days: 3,
                min_order: 1,
            },
        ],
        zones: vec![
            DeliveryZone {
                id: DeliveryZoneId("cdmx_centro".to_string()),
                zone: "CDMX Centro".to_string(),
                days: 1,
                cost: Decimal::new(5_000, 2),
                description: Some("Cuauhtémoc, Benito Juárez y alrededores".to_string()),
            },
            DeliveryZone {
                id: DeliveryZoneId("cdmx_sur".to_string()),
                zone: "CDMX Sur".to_string(),
                days: 2,
                cost: Decimal::new(8_000, 2),
                description: Some("Coyoacán, Tlalpan, Xochimilco".to_string()),
            },
            DeliveryZone {
                id: DeliveryZoneId("area_metropolitana".to_string()),
                zone: "Área Metropolitana".to_string(),
                days: 3,
                cost: Decimal::new(12_000, 2),
                description: Some("Naucalpan, Tlalnepantla, Ecatepec".to_string()),
            },
        ],
        presales: vec![
            PresaleProduct {
                id: PresaleProductId("PRE001".to_string()),
                name: "Harina Premium Italiana 25kg".to_string(),
                category: Some("Harinas".to_string()),
                price: Decimal::new(125_000, 2),
                deposit: Decimal::new(30_000, 2),
                release_date: "Marzo 2025".to_string(),
                description: Some("Tipo 00, ideal para pizza y pan artesanal".to_string()),
            },
            PresaleProduct {
                id: PresaleProductId("PRE002".to_string()),
                name: "Chocolate Belga 5kg".to_string(),
                category: Some("Repostería".to_string()),
                price: Decimal::new(89_000, 2),
                deposit: Decimal::new(20_000, 2),
                release_date: "Abril 2025".to_string(),
                description: None,
            },
        ],
        failing: AtomicBool::new(false),
    }
}
