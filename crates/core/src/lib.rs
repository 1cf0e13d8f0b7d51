pub mod catalog;
pub mod commerce;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod memory;
pub mod session;

pub use catalog::{CatalogGateway, CategoryListing};
pub use commerce::{
    CartAddition, CartLineView, CartStore, CartView, CommerceService, ReservationLineView,
    ReservationReceipt, ReservationStore, ReservationView,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use dialogue::{DialogueEngine, InboundMessage, Reply};
pub use domain::cart::{Cart, CartId, CartItem, CartItemId, CartStatus};
pub use domain::company::Company;
pub use domain::product::{Category, CategoryId, Product, ProductId, StockLevel};
pub use domain::reservation::{
    PresaleProduct, PresaleProductId, Reservation, ReservationId, ReservationItem,
    ReservationItemId, ReservationStatus,
};
pub use domain::zone::{DeliveryZone, DeliveryZoneId};
pub use errors::{CommerceError, DomainError, StoreError};
pub use session::{MemorySessionStore, Session, SessionHandle, SessionStep, SessionStore};
