use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::info;

use crate::db::new_id;
use crate::error::{on_duplicate, ApiError};
use crate::model::service::{
    CreateMenuItemRequest, CreateServiceRequest, MenuItem, RepairService, ServiceIcon,
    ServiceQuery, UpdateServiceRequest,
};
use crate::routes::auth::require_admin;
use crate::AppState;

const SERVICE_COLUMNS: &str = "id, label, price, duration, icon, image_url, created_at";

pub fn service_router() -> Router {
    Router::new()
        .route("/api/services", get(list_services).post(create_service))
        .route(
            "/api/services/:id",
            axum::routing::put(update_service).delete(delete_service),
        )
        .route("/api/menu-items", get(list_menu_items).post(create_menu_item))
        .route("/api/menu-items/:id", axum::routing::delete(delete_menu_item))
}

fn parse_icon(raw: &str) -> Result<ServiceIcon, ApiError> {
    ServiceIcon::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("unknown icon key '{raw}'")))
}

/// A service label has to come from the menu-item list; the dropdown in the
/// admin form enforces this loosely, the API enforces it for real.
async fn ensure_label_in_menu(state: &AppState, label: &str) -> Result<(), ApiError> {
    let row = sqlx::query_as::<_, (String,)>(
        "SELECT label FROM service_menu_items WHERE label = ? COLLATE NOCASE LIMIT 1",
    )
    .bind(label)
    .fetch_optional(&state.db)
    .await?;

    if row.is_none() {
        return Err(ApiError::Validation(format!(
            "'{label}' is not in the service menu"
        )));
    }
    Ok(())
}

async fn list_services(
    Extension(state): Extension<AppState>,
    Query(params): Query<ServiceQuery>,
) -> Result<Json<Vec<RepairService>>, ApiError> {
    let mut services = sqlx::query_as::<_, RepairService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM repair_services ORDER BY created_at ASC"
    ))
    .fetch_all(&state.db)
    .await?;

    if let Some(q) = params.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
        services.retain(|s| {
            s.label.to_lowercase().contains(&q)
                || s.price.to_lowercase().contains(&q)
                || s.duration.to_lowercase().contains(&q)
        });
    }

    Ok(Json(services))
}

async fn create_service(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<Json<RepairService>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let label = payload.label.trim();
    if label.is_empty() {
        return Err(ApiError::Validation("label is required".to_string()));
    }
    if payload.price.trim().is_empty() {
        return Err(ApiError::Validation("price is required".to_string()));
    }
    if payload.duration.trim().is_empty() {
        return Err(ApiError::Validation("duration is required".to_string()));
    }
    let icon = parse_icon(payload.icon.trim())?;
    ensure_label_in_menu(&state, label).await?;

    let service = RepairService {
        id: new_id(),
        label: label.to_string(),
        price: payload.price.trim().to_string(),
        duration: payload.duration.trim().to_string(),
        icon: icon.as_str().to_string(),
        image_url: payload.image_url,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO repair_services (id, label, price, duration, icon, image_url, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&service.id)
    .bind(&service.label)
    .bind(&service.price)
    .bind(&service.duration)
    .bind(&service.icon)
    .bind(&service.image_url)
    .bind(service.created_at)
    .execute(&state.db)
    .await
    .map_err(|e| on_duplicate(e, &format!("a service labelled '{}'", service.label)))?;

    info!(label = %service.label, "repair service created");
    Ok(Json(service))
}

async fn update_service(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<Json<RepairService>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let existing = sqlx::query_as::<_, RepairService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM repair_services WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("service"))?;

    let label = match payload.label {
        Some(label) if !label.trim().is_empty() => {
            ensure_label_in_menu(&state, label.trim()).await?;
            label.trim().to_string()
        }
        _ => existing.label,
    };
    let icon = match payload.icon {
        Some(raw) => parse_icon(raw.trim())?.as_str().to_string(),
        None => existing.icon,
    };
    let price = payload.price.unwrap_or(existing.price);
    let duration = payload.duration.unwrap_or(existing.duration);
    let image_url = payload.image_url.or(existing.image_url);

    sqlx::query(
        "UPDATE repair_services SET label = ?, price = ?, duration = ?, icon = ?, image_url = ?
         WHERE id = ?",
    )
    .bind(&label)
    .bind(&price)
    .bind(&duration)
    .bind(&icon)
    .bind(&image_url)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| on_duplicate(e, &format!("a service labelled '{label}'")))?;

    let updated = sqlx::query_as::<_, RepairService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM repair_services WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

async fn delete_service(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM repair_services WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("service"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn list_menu_items(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let items = sqlx::query_as::<_, MenuItem>(
        "SELECT id, label, created_at FROM service_menu_items ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(items))
}

async fn create_menu_item(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> Result<Json<MenuItem>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let label = payload.label.trim();
    if label.is_empty() {
        return Err(ApiError::Validation("label is required".to_string()));
    }

    let item = MenuItem {
        id: new_id(),
        label: label.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO service_menu_items (id, label, created_at) VALUES (?, ?, ?)")
        .bind(&item.id)
        .bind(&item.label)
        .bind(item.created_at)
        .execute(&state.db)
        .await
        .map_err(|e| on_duplicate(e, &format!("a menu item labelled '{}'", item.label)))?;

    Ok(Json(item))
}

async fn delete_menu_item(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM service_menu_items WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("menu item"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
