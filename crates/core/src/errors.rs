use thiserror::Error;

use crate::domain::product::ProductId;
use crate::domain::reservation::PresaleProductId;

/// Failures a state handler understands and renders as a specific,
/// actionable reply. None of these advance the conversation state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("product `{0}` not found in catalog")]
    ProductNotFound(ProductId),
    #[error("presale product `{0}` not found")]
    PresaleProductNotFound(PresaleProductId),
    #[error("insufficient stock for `{product_id}`: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64, unit: String },
}

/// Catalog or store call failed. Caught at the per-message dispatch
/// boundary, logged, and converted to one generic apology reply with the
/// session step preserved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("upstream store unavailable: {0}")]
    Unavailable(String),
    #[error("upstream row could not be decoded: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn unavailable(source: impl std::fmt::Display) -> Self {
        Self::Unavailable(source.to_string())
    }

    pub fn decode(source: impl std::fmt::Display) -> Self {
        Self::Decode(source.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommerceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
