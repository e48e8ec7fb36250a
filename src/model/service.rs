use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of icon keys the frontend can render. Anything else is a
/// validation error at write time, never a runtime fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceIcon {
    Screen,
    Battery,
    Water,
    Camera,
    Speaker,
    Charging,
    Software,
    Wrench,
}

impl ServiceIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceIcon::Screen => "screen",
            ServiceIcon::Battery => "battery",
            ServiceIcon::Water => "water",
            ServiceIcon::Camera => "camera",
            ServiceIcon::Speaker => "speaker",
            ServiceIcon::Charging => "charging",
            ServiceIcon::Software => "software",
            ServiceIcon::Wrench => "wrench",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        const ALL: &[ServiceIcon] = &[
            ServiceIcon::Screen,
            ServiceIcon::Battery,
            ServiceIcon::Water,
            ServiceIcon::Camera,
            ServiceIcon::Speaker,
            ServiceIcon::Charging,
            ServiceIcon::Software,
            ServiceIcon::Wrench,
        ];
        ALL.iter().copied().find(|icon| icon.as_str() == s)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RepairService {
    pub id: String,
    pub label: String,
    pub price: String,
    pub duration: String,
    pub icon: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub label: String,
    pub price: String,
    pub duration: String,
    pub icon: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub label: Option<String>,
    pub price: Option<String>,
    pub duration: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_keys_round_trip() {
        for key in [
            "screen", "battery", "water", "camera", "speaker", "charging", "software", "wrench",
        ] {
            let icon = ServiceIcon::parse(key).expect(key);
            assert_eq!(icon.as_str(), key);
        }
    }

    #[test]
    fn unknown_icon_key_is_rejected() {
        assert_eq!(ServiceIcon::parse("sparkles"), None);
        assert_eq!(ServiceIcon::parse(""), None);
    }
}
