use axum::{
    extract::{Extension, Json, Path},
    http::HeaderMap,
    routing::get,
    Router,
};
use chrono::Utc;

use crate::error::ApiError;
use crate::model::settings::{GeneralSettings, ServicesSettings, SettingsRow, KEY_GENERAL, KEY_SERVICES};
use crate::routes::auth::require_admin;
use crate::AppState;

pub fn settings_router() -> Router {
    Router::new().route("/api/settings/:key", get(get_settings).put(put_settings))
}

fn check_key(key: &str) -> Result<(), ApiError> {
    if key == KEY_GENERAL || key == KEY_SERVICES {
        Ok(())
    } else {
        Err(ApiError::NotFound("settings key"))
    }
}

/// Whole-value validation: the payload has to deserialize as the typed shape
/// for its key before it is stored back as JSON.
fn normalize(key: &str, value: &serde_json::Value) -> Result<String, ApiError> {
    let normalized = match key {
        KEY_GENERAL => {
            let parsed: GeneralSettings = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::Validation(format!("invalid general settings: {e}")))?;
            serde_json::to_value(parsed)
        }
        _ => {
            let parsed: ServicesSettings = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::Validation(format!("invalid services settings: {e}")))?;
            serde_json::to_value(parsed)
        }
    };
    normalized
        .map(|v| v.to_string())
        .map_err(|e| ApiError::Validation(format!("invalid settings payload: {e}")))
}

async fn get_settings(
    Extension(state): Extension<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_key(&key)?;

    let row = sqlx::query_as::<_, SettingsRow>(
        "SELECT key, value, updated_at FROM site_settings WHERE key = ? LIMIT 1",
    )
    .bind(&key)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("settings key"))?;

    let value: serde_json::Value = serde_json::from_str(&row.value)
        .map_err(|e| ApiError::Validation(format!("stored settings are corrupt: {e}")))?;
    Ok(Json(value))
}

async fn put_settings(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state.db).await?;
    check_key(&key)?;

    let value = normalize(&key, &payload)?;

    sqlx::query(
        "INSERT INTO site_settings (key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(&key)
    .bind(&value)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    Ok(Json(payload))
}
