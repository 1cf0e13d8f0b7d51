use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresaleProductId(pub String);

impl PresaleProductId {
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl std::fmt::Display for PresaleProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog item sold via deposit-based reservation ahead of availability.
/// Presale items are not stock-limited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleProduct {
    pub id: PresaleProductId,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub deposit: Decimal,
    pub release_date: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Shortened form shown in the reservations view.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationItemId(pub String);

impl ReservationItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Reservations start `pending`; the remaining states are set by staff when
/// the deposit is confirmed or the request is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "⏳ Pendiente",
            Self::Confirmed => "✅ Confirmada",
            Self::Cancelled => "❌ Cancelada",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub address: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReservationItem>,
}

impl Reservation {
    /// A fresh `pending` reservation with a single line. Every successful
    /// presale request creates a new record; there is no merging with prior
    /// reservations for the same address or product.
    pub fn pending(address: impl Into<String>, presale_id: PresaleProductId, quantity: i64) -> Self {
        let id = ReservationId::generate();
        let item = ReservationItem {
            id: ReservationItemId::generate(),
            reservation_id: id.clone(),
            presale_product_id: presale_id,
            quantity,
        };
        Self {
            id,
            address: address.into(),
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
            items: vec![item],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationItem {
    pub id: ReservationItemId,
    pub reservation_id: ReservationId,
    pub presale_product_id: PresaleProductId,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::{PresaleProductId, Reservation, ReservationStatus};

    #[test]
    fn pending_reservation_carries_one_line_with_back_reference() {
        let reservation =
            Reservation::pending("5215500000001", PresaleProductId("PRE001".to_string()), 2);

        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.items.len(), 1);
        assert_eq!(reservation.items[0].reservation_id, reservation.id);
        assert_eq!(reservation.items[0].quantity, 2);
    }

    #[test]
    fn short_id_is_a_prefix() {
        let reservation =
            Reservation::pending("5215500000001", PresaleProductId("PRE001".to_string()), 1);
        assert_eq!(reservation.id.short().len(), 8);
        assert!(reservation.id.0.starts_with(reservation.id.short()));
    }
}
