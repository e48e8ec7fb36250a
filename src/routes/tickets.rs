use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::info;

use crate::db::new_id;
use crate::error::ApiError;
use crate::model::ticket::{CreateTicketRequest, SupportTicket, TicketQuery};
use crate::routes::auth::{current_user, require_admin};
use crate::AppState;

pub fn ticket_router() -> Router {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/:id", axum::routing::delete(delete_ticket))
}

/// Contact form. Requires a session; the email on the ticket is the signed-in
/// identity's, not whatever the form claims.
async fn create_ticket(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<Json<SupportTicket>, ApiError> {
    let user = current_user(&headers, &state.db).await?;

    if payload.subject.trim().is_empty() {
        return Err(ApiError::Validation("subject is required".to_string()));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::Validation("message is required".to_string()));
    }

    let ticket = SupportTicket {
        id: new_id(),
        name: if payload.name.trim().is_empty() {
            user.full_name.clone()
        } else {
            payload.name.trim().to_string()
        },
        email: user.email.clone(),
        subject: payload.subject.trim().to_string(),
        message: payload.message.trim().to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO support_tickets (id, name, email, subject, message, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&ticket.id)
    .bind(&ticket.name)
    .bind(&ticket.email)
    .bind(&ticket.subject)
    .bind(&ticket.message)
    .bind(ticket.created_at)
    .execute(&state.db)
    .await?;

    info!(ticket_id = %ticket.id, "support ticket created");
    Ok(Json(ticket))
}

async fn list_tickets(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Query(params): Query<TicketQuery>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let mut tickets = sqlx::query_as::<_, SupportTicket>(
        "SELECT id, name, email, subject, message, created_at
         FROM support_tickets ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    if let Some(q) = params.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
        tickets.retain(|t| {
            t.name.to_lowercase().contains(&q)
                || t.email.to_lowercase().contains(&q)
                || t.subject.to_lowercase().contains(&q)
        });
    }

    Ok(Json(tickets))
}

async fn delete_ticket(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM support_tickets WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("ticket"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
