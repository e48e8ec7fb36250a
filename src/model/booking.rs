use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUSES: &[BookingStatus] = &[
    BookingStatus::Received,
    BookingStatus::Diagnosing,
    BookingStatus::WaitingForParts,
    BookingStatus::InProgress,
    BookingStatus::ReadyForPickup,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Received,
    Diagnosing,
    WaitingForParts,
    InProgress,
    ReadyForPickup,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Received => "received",
            BookingStatus::Diagnosing => "diagnosing",
            BookingStatus::WaitingForParts => "waiting_for_parts",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::ReadyForPickup => "ready_for_pickup",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        STATUSES.iter().copied().find(|status| status.as_str() == s)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: String,
    pub user_id: Option<String>,
    pub service_label: String,
    pub device_category: String,
    pub device_brand: String,
    pub device_model: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_label: String,
    pub device_category: String,
    pub device_brand: String,
    pub device_model: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub status: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub total: usize,
}
