use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::info;

use crate::db::new_id;
use crate::error::ApiError;
use crate::model::booking::{
    Booking, BookingListResponse, BookingQuery, BookingStatus, CreateBookingRequest,
    UpdateBookingRequest,
};
use crate::routes::auth::{current_user, require_admin};
use crate::wizard::{self, BookingDraft, Event, Step};
use crate::AppState;

const BOOKING_COLUMNS: &str = "id, user_id, service_label, device_category, device_brand, \
    device_model, appointment_date, appointment_time, customer_name, customer_email, \
    customer_phone, status, estimated_cost, notes, created_at";

pub fn booking_router() -> Router {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_own_bookings))
        .route("/api/bookings/all", get(list_all_bookings))
        .route(
            "/api/bookings/:id",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
}

/// Submit the booking wizard. The handler replays the step machine against
/// the submitted draft; whichever step the walk strands on names the missing
/// guard. Landing on Contact is the unauthenticated path and maps to 401,
/// the API form of the widget's redirect to the login surface.
async fn create_booking(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = match current_user(&headers, &state.db).await {
        Ok(user) => Some(user),
        Err(ApiError::Unauthorized(_)) => None,
        Err(err) => return Err(err),
    };

    let draft = BookingDraft {
        service_label: payload.service_label.clone(),
        device_category: payload.device_category.clone(),
        device_brand: payload.device_brand.clone(),
        device_model: payload.device_model.clone(),
        appointment_date: payload.appointment_date.clone(),
        appointment_time: payload.appointment_time.clone(),
        customer_name: payload.customer_name.clone().unwrap_or_default(),
        customer_email: user.as_ref().map(|u| u.email.clone()).unwrap_or_default(),
        customer_phone: payload.customer_phone.clone().unwrap_or_default(),
    };

    match wizard::walk_to_submission(&draft, user.is_some()) {
        Step::Service => {
            return Err(ApiError::Validation("please select a service".to_string()))
        }
        Step::Device => {
            return Err(ApiError::Validation(
                "please select your device's category, brand and model".to_string(),
            ))
        }
        Step::Contact => {
            return Err(ApiError::Unauthorized("sign in to complete your booking"))
        }
        Step::Schedule | Step::Confirmation => {}
    }

    let progress = draft.progress(true);
    if !progress.schedule_chosen {
        return Err(ApiError::Validation(
            "please pick an appointment date and time".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(draft.appointment_date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::Validation("appointment date must be YYYY-MM-DD".to_string()))?;
    NaiveTime::parse_from_str(draft.appointment_time.trim(), "%I:%M %p")
        .map_err(|_| ApiError::Validation("appointment time must look like 10:00 AM".to_string()))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("sign in to complete your booking"));
    };
    let booking = Booking {
        id: new_id(),
        user_id: Some(user.id.clone()),
        service_label: draft.service_label.trim().to_string(),
        device_category: draft.device_category.trim().to_string(),
        device_brand: draft.device_brand.trim().to_string(),
        device_model: draft.device_model.trim().to_string(),
        appointment_date: date,
        appointment_time: draft.appointment_time.trim().to_string(),
        customer_name: payload
            .customer_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.full_name.clone()),
        customer_email: user.email.clone(),
        customer_phone: payload
            .customer_phone
            .filter(|phone| !phone.trim().is_empty())
            .unwrap_or_else(|| user.phone.clone()),
        status: BookingStatus::Received.as_str().to_string(),
        estimated_cost: None,
        notes: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO bookings (id, user_id, service_label, device_category, device_brand, \
         device_model, appointment_date, appointment_time, customer_name, customer_email, \
         customer_phone, status, estimated_cost, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&booking.id)
    .bind(&booking.user_id)
    .bind(&booking.service_label)
    .bind(&booking.device_category)
    .bind(&booking.device_brand)
    .bind(&booking.device_model)
    .bind(booking.appointment_date)
    .bind(&booking.appointment_time)
    .bind(&booking.customer_name)
    .bind(&booking.customer_email)
    .bind(&booking.customer_phone)
    .bind(&booking.status)
    .bind(booking.estimated_cost)
    .bind(&booking.notes)
    .bind(booking.created_at)
    .execute(&state.db)
    .await?;

    let step = wizard::transition(Step::Schedule, Event::SubmitSucceeded, &progress);
    info!(booking_id = %booking.id, customer = %booking.customer_email, "booking created");

    Ok(Json(serde_json::json!({
        "step": step.number(),
        "booking": booking,
    })))
}

async fn list_own_bookings(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
) -> Result<Json<BookingListResponse>, ApiError> {
    let user = current_user(&headers, &state.db).await?;

    let bookings = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? ORDER BY created_at DESC"
    ))
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let total = bookings.len();
    Ok(Json(BookingListResponse { bookings, total }))
}

async fn list_all_bookings(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Query(params): Query<BookingQuery>,
) -> Result<Json<BookingListResponse>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let mut bookings = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
    ))
    .fetch_all(&state.db)
    .await?;

    if let Some(q) = params.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
        bookings.retain(|b| {
            b.customer_name.to_lowercase().contains(&q)
                || b.customer_email.to_lowercase().contains(&q)
                || b.device_model.to_lowercase().contains(&q)
                || b.status.to_lowercase().contains(&q)
        });
    }

    let total = bookings.len();
    Ok(Json(BookingListResponse { bookings, total }))
}

async fn get_booking(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let booking = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("booking"))?;

    Ok(Json(booking))
}

/// Admin edits touch status, estimated cost and internal notes only; the
/// customer's own fields are never projected from the payload.
async fn update_booking(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let existing = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("booking"))?;

    let status = match payload.status {
        Some(raw) => BookingStatus::parse(&raw)
            .ok_or_else(|| ApiError::Validation(format!("unknown status '{raw}'")))?
            .as_str()
            .to_string(),
        None => existing.status,
    };
    let estimated_cost = payload.estimated_cost.or(existing.estimated_cost);
    let notes = payload.notes.or(existing.notes);

    sqlx::query("UPDATE bookings SET status = ?, estimated_cost = ?, notes = ? WHERE id = ?")
        .bind(&status)
        .bind(estimated_cost)
        .bind(&notes)
        .bind(&id)
        .execute(&state.db)
        .await?;

    let updated = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

async fn delete_booking(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("booking"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
