use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tracing::warn;

use crate::catalog::{self, DeviceTree};
use crate::db::{self, new_id};
use crate::error::{on_duplicate, ApiError};
use crate::model::device::{
    CreateDeviceModelRequest, DeviceModel, ModelLookupQuery, ModelLookupResponse, SeedResponse,
};
use crate::routes::auth::require_admin;
use crate::AppState;

pub fn device_router() -> Router {
    Router::new()
        .route("/api/device-models", get(list_models).post(create_model))
        .route("/api/device-models/tree", get(model_tree))
        .route("/api/device-models/lookup", get(lookup_model))
        .route("/api/device-models/seed", post(seed_models))
        .route("/api/device-models/:id", axum::routing::delete(delete_model))
}

async fn fetch_rows(state: &AppState) -> Result<Vec<(String, String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String, String)>(
        "SELECT category, brand, model FROM device_models ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await
}

/// The merged catalog tree. If the table can't be read the seed tree is
/// served alone; the visitor never sees the failure.
async fn merged_tree(state: &AppState) -> DeviceTree {
    let seed = catalog::seed_tree();
    match fetch_rows(state).await {
        Ok(rows) => catalog::merge(&seed, &rows),
        Err(err) => {
            warn!(error = %err, "device model fetch failed; serving seed catalog only");
            seed
        }
    }
}

async fn model_tree(Extension(state): Extension<AppState>) -> Json<DeviceTree> {
    Json(merged_tree(&state).await)
}

async fn lookup_model(
    Extension(state): Extension<AppState>,
    Query(params): Query<ModelLookupQuery>,
) -> Result<Json<ModelLookupResponse>, ApiError> {
    let tree = merged_tree(&state).await;
    let (category, brand) =
        catalog::find_model(&tree, &params.model).ok_or(ApiError::NotFound("device model"))?;

    Ok(Json(ModelLookupResponse {
        category: category.to_string(),
        brand: brand.to_string(),
        model: params.model,
    }))
}

async fn list_models(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<DeviceModel>>, ApiError> {
    let models = sqlx::query_as::<_, DeviceModel>(
        "SELECT id, category, brand, model, created_at FROM device_models ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(models))
}

async fn create_model(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateDeviceModelRequest>,
) -> Result<Json<DeviceModel>, ApiError> {
    require_admin(&headers, &state.db).await?;

    if payload.category.trim().is_empty()
        || payload.brand.trim().is_empty()
        || payload.model.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "category, brand and model are all required".to_string(),
        ));
    }

    let model = DeviceModel {
        id: new_id(),
        category: payload.category.trim().to_string(),
        brand: payload.brand.trim().to_string(),
        model: payload.model.trim().to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO device_models (id, category, brand, model, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&model.id)
    .bind(&model.category)
    .bind(&model.brand)
    .bind(&model.model)
    .bind(model.created_at)
    .execute(&state.db)
    .await
    .map_err(|e| on_duplicate(e, &format!("{} {}", model.brand, model.model)))?;

    Ok(Json(model))
}

async fn delete_model(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;

    let result = sqlx::query("DELETE FROM device_models WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("device model"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Re-plant the static catalog. Skip-if-exists by (brand, model), so a
/// second run reports zero inserts.
async fn seed_models(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
) -> Result<Json<SeedResponse>, ApiError> {
    require_admin(&headers, &state.db).await?;
    let (inserted, skipped) = db::seed_device_models(&state.db).await?;
    Ok(Json(SeedResponse { inserted, skipped }))
}
