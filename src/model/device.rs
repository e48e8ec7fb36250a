use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceModel {
    pub id: String,
    pub category: String,
    pub brand: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeviceModelRequest {
    pub category: String,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelLookupQuery {
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ModelLookupResponse {
    pub category: String,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub inserted: u64,
    pub skipped: u64,
}
