use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
    routing::get,
    Router,
};
use chrono::Utc;

use crate::db::new_id;
use crate::error::ApiError;
use crate::model::inventory::{
    CreateInventoryRequest, InventoryItem, InventoryQuery, InventoryStatus, UpdateInventoryRequest,
};
use crate::routes::auth::require_admin;
use crate::AppState;

const INVENTORY_COLUMNS: &str = "id, title, brand, category, price, condition, storage, color, \
    status, quantity, image_url, description, created_at";

pub fn inventory_router() -> Router {
    Router::new()
        .route("/api/inventory", get(list_items).post(create_item))
        .route(
            "/api/inventory/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

fn parse_status(raw: &str) -> Result<InventoryStatus, ApiError> {
    InventoryStatus::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("unknown inventory status '{raw}'")))
}

async fn list_items(
    Extension(state): Extension<AppState>,
    Query(params): Query<InventoryQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let mut items = sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM device_inventory ORDER BY created_at ASC"
    ))
    .fetch_all(&state.db)
    .await?;

    if let Some(q) = params.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
        items.retain(|item| {
            item.title.to_lowercase().contains(&q)
                || item.brand.to_lowercase().contains(&q)
                || item.category.to_lowercase().contains(&q)
        });
    }

    Ok(Json(items))
}

async fn get_item(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>, ApiError> {
    let item = sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM device_inventory WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("inventory item"))?;

    Ok(Json(item))
}

async fn create_item(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    require_admin(&headers, &state.db).await?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    if payload.brand.trim().is_empty() {
        return Err(ApiError::Validation("brand is required".to_string()));
    }
    if payload.price < 0.0 {
        return Err(ApiError::Validation("price cannot be negative".to_string()));
    }
    let status = match payload.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => InventoryStatus::Available,
    };

    let item = InventoryItem {
        id: new_id(),
        title: payload.title.trim().to_string(),
        brand: payload.brand.trim().to_string(),
        category: payload.category.trim().to_string(),
        price: payload.price,
        condition: payload.condition.trim().to_string(),
        storage: payload.storage,
        color: payload.color,
        status: status.as_str().to_string(),
        quantity: payload.quantity.unwrap_or(0).max(0),
        image_url: payload.image_url,
        description: payload.description,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO device_inventory (id, title, brand, category, price, condition, storage, \
         color, status, quantity, image_url, description, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.title)
    .bind(&item.brand)
    .bind(&item.category)
    .bind(item.price)
    .bind(&item.condition)
    .bind(&item.storage)
    .bind(&item.color)
    .bind(&item.status)
    .bind(item.quantity)
    .bind(&item.image_url)
    .bind(&item.description)
    .bind(item.created_at)
    .execute(&state.db)
    .await?;

    Ok(Json(item))
}

async fn update_item(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let existing = sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM device_inventory WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("inventory item"))?;

    let status = match payload.status.as_deref() {
        Some(raw) => parse_status(raw)?.as_str().to_string(),
        None => existing.status,
    };
    let title = payload.title.unwrap_or(existing.title);
    let brand = payload.brand.unwrap_or(existing.brand);
    let category = payload.category.unwrap_or(existing.category);
    let price = payload.price.unwrap_or(existing.price);
    let condition = payload.condition.unwrap_or(existing.condition);
    let storage = payload.storage.or(existing.storage);
    let color = payload.color.or(existing.color);
    let quantity = payload.quantity.unwrap_or(existing.quantity).max(0);
    let image_url = payload.image_url.or(existing.image_url);
    let description = payload.description.or(existing.description);

    sqlx::query(
        "UPDATE device_inventory SET title = ?, brand = ?, category = ?, price = ?, \
         condition = ?, storage = ?, color = ?, status = ?, quantity = ?, image_url = ?, \
         description = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&brand)
    .bind(&category)
    .bind(price)
    .bind(&condition)
    .bind(&storage)
    .bind(&color)
    .bind(&status)
    .bind(quantity)
    .bind(&image_url)
    .bind(&description)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let updated = sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM device_inventory WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

async fn delete_item(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM device_inventory WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("inventory item"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
