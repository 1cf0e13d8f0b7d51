use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartId(pub String);

impl CartId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub String);

impl CartItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Only `Active` carts are ever created by the bot; the terminal states exist
/// for back-office flows that close a quotation out of band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    Completed,
    Abandoned,
}

impl CartStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// The one open quotation cart for a customer address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub address: String,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new_active(address: impl Into<String>) -> Self {
        Self {
            id: CartId::generate(),
            address: address.into(),
            status: CartStatus::Active,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}
