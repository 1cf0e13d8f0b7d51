use serde::{Deserialize, Serialize};

/// Singleton contact card rendered throughout the replies. When the row is
/// missing from the catalog store the hard-coded fallbacks below are used so
/// the bot keeps answering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub description: Option<String>,
    pub phone: String,
    pub schedule: String,
    pub address: String,
}

pub const FALLBACK_NAME: &str = "Zafra";
pub const FALLBACK_PHONE: &str = "55 6805 9501";
pub const FALLBACK_SCHEDULE: &str = "Lunes a Viernes: 9:00 am - 6:00 pm";
pub const FALLBACK_ADDRESS: &str = "Avenida Central de Abastos, 09040 Ciudad de México";

impl Company {
    pub fn name_or_default(company: Option<&Company>) -> &str {
        company.map_or(FALLBACK_NAME, |c| c.name.as_str())
    }

    pub fn phone_or_default(company: Option<&Company>) -> &str {
        company.map_or(FALLBACK_PHONE, |c| c.phone.as_str())
    }

    pub fn schedule_or_default(company: Option<&Company>) -> &str {
        company.map_or(FALLBACK_SCHEDULE, |c| c.schedule.as_str())
    }

    pub fn address_or_default(company: Option<&Company>) -> &str {
        company.map_or(FALLBACK_ADDRESS, |c| c.address.as_str())
    }
}
