use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable catalog key, e.g. `ZAF001`. Customer input is normalized to
/// uppercase before lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub stock: i64,
    pub unit: String,
    pub available: bool,
    pub delivery_days: u32,
    pub min_order: u32,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.available && self.stock > 0
    }

    pub fn stock_level(&self) -> StockLevel {
        match self.stock {
            s if s > 20 => StockLevel::High,
            s if s > 10 => StockLevel::Medium,
            s if s > 0 => StockLevel::Low,
            _ => StockLevel::Out,
        }
    }
}

/// Coarse stock bucket used by the availability detail reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockLevel {
    High,
    Medium,
    Low,
    Out,
}

impl StockLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "Alto",
            Self::Medium => "Medio",
            Self::Low => "Bajo",
            Self::Out => "Sin stock",
        }
    }
}
