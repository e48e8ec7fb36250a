use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const KEY_GENERAL: &str = "general";
pub const KEY_SERVICES: &str = "services";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SettingsRow {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Shop branding, contact info, hours, socials, open flag. Stored as the
/// JSON value of the `general` settings key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub shop_name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub opening_hours: String,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub is_open: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            shop_name: "TechMend".to_string(),
            tagline: "Fast, honest device repairs".to_string(),
            email: "hello@techmend.example".to_string(),
            phone: "+1 555 0100".to_string(),
            address: "12 High Street".to_string(),
            opening_hours: "Mon-Sat 9:00-18:00".to_string(),
            instagram: None,
            facebook: None,
            is_open: true,
        }
    }
}

/// Presentation copy for the services page, stored under the `services` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesSettings {
    pub heading: String,
    pub intro: String,
    pub warranty_note: String,
}

impl Default for ServicesSettings {
    fn default() -> Self {
        Self {
            heading: "What we fix".to_string(),
            intro: "Screens, batteries, water damage and more, usually same day.".to_string(),
            warranty_note: "All repairs carry a 90-day warranty.".to_string(),
        }
    }
}
