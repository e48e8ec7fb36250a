use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    Available,
    OutOfStock,
}

impl InventoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryStatus::Available => "available",
            InventoryStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(InventoryStatus::Available),
            "out_of_stock" => Some(InventoryStatus::OutOfStock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryItem {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub condition: String,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub status: String,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub title: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub condition: String,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub q: Option<String>,
}
