use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryZoneId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: DeliveryZoneId,
    pub zone: String,
    pub days: u32,
    pub cost: Decimal,
    pub description: Option<String>,
}

impl DeliveryZone {
    /// Case-insensitive substring containment against zone name or
    /// description, the same matching the customer-facing lookup uses.
    pub fn matches(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        if self.zone.to_lowercase().contains(&needle) {
            return true;
        }
        self.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DeliveryZone, DeliveryZoneId};

    fn zone() -> DeliveryZone {
        DeliveryZone {
            id: DeliveryZoneId("cdmx_centro".to_string()),
            zone: "CDMX Centro".to_string(),
            days: 1,
            cost: Decimal::new(5_000, 2),
            description: Some("Cuauhtémoc, Benito Juárez y alrededores".to_string()),
        }
    }

    #[test]
    fn matches_zone_name_case_insensitively() {
        assert!(zone().matches("cdmx"));
        assert!(zone().matches("  CENTRO "));
    }

    #[test]
    fn matches_description_substring() {
        assert!(zone().matches("benito"));
    }

    #[test]
    fn empty_input_matches_nothing() {
        assert!(!zone().matches("   "));
    }
}
