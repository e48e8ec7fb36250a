use axum::{
    extract::{Extension, Json, Multipart, Path},
    http::HeaderMap,
    routing::post,
    Router,
};
use tokio::fs;
use tracing::info;

use crate::db::new_id;
use crate::error::ApiError;
use crate::routes::auth::{current_user, require_admin};
use crate::AppState;

const BUCKETS: &[&str] = &["images", "services", "avatars"];

pub fn upload_router() -> Router {
    Router::new().route("/api/uploads/:bucket", post(upload))
}

fn safe_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit('.').next())
        .map(|ext| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(8)
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string())
}

/// Store one uploaded file under its bucket and hand back the public URL.
/// Nothing is written unless the whole body arrives; a failed read saves no
/// partial record anywhere.
async fn upload(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !BUCKETS.contains(&bucket.as_str()) {
        return Err(ApiError::NotFound("bucket"));
    }

    // Profile photos are self-service; the other buckets are admin-only.
    if bucket == "avatars" {
        current_user(&headers, &state.db).await?;
    } else {
        require_admin(&headers, &state.db).await?;
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid upload: {e}")))?
        .ok_or_else(|| ApiError::Validation("no file in upload".to_string()))?;

    let extension = safe_extension(field.file_name());
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid upload: {e}")))?;

    if data.is_empty() {
        return Err(ApiError::Validation("uploaded file is empty".to_string()));
    }

    let file_name = format!("{}.{extension}", new_id());
    let dir = state.upload_dir.join(&bucket);
    fs::create_dir_all(&dir).await?;
    fs::write(dir.join(&file_name), &data).await?;

    let url = format!("/storage/{bucket}/{file_name}");
    info!(%url, bytes = data.len(), "file uploaded");
    Ok(Json(serde_json::json!({ "url": url })))
}
