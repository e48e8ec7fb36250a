use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Json},
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use rand_core::OsRng;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::new_id;
use crate::error::{on_duplicate, ApiError};
use crate::model::user::{
    LoginRequest, ProfileResponse, RegisterRequest, Session, TokenResponse, UpdateProfileRequest,
    User,
};
use crate::AppState;

/// Sessions older than this are invalidated the next time they show up.
const SESSION_MAX_AGE_HOURS: i64 = 24;

pub fn auth_router() -> Router {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me).put(update_me))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::Internal("could not hash password".to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller's identity from the bearer token. A session past its
/// 24h sign-in window is deleted on the spot and the caller gets a 401.
pub async fn current_user(headers: &HeaderMap, pool: &SqlitePool) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized("authentication required"))?;

    let session = sqlx::query_as::<_, Session>(
        "SELECT token, user_id, signed_in_at FROM sessions WHERE token = ? LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::Unauthorized("authentication required"))?;

    if Utc::now() - session.signed_in_at > Duration::hours(SESSION_MAX_AGE_HOURS) {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&session.token)
            .execute(pool)
            .await?;
        return Err(ApiError::Unauthorized("session expired, sign in again"));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, full_name, email, phone, password_hash, avatar_url, created_at
         FROM users WHERE id = ? LIMIT 1",
    )
    .bind(&session.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::Unauthorized("authentication required"))?;

    Ok(user)
}

pub async fn is_admin(pool: &SqlitePool, email: &str) -> Result<bool, ApiError> {
    let row = sqlx::query_as::<_, (String,)>(
        "SELECT email FROM admin_users WHERE email = ? COLLATE NOCASE LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Admin gate: a signed-in caller whose email is not on the allow-list is
/// forcibly signed out (their session is deleted) and refused.
pub async fn require_admin(headers: &HeaderMap, pool: &SqlitePool) -> Result<User, ApiError> {
    let user = current_user(headers, pool).await?;
    if is_admin(pool, &user.email).await? {
        return Ok(user);
    }

    warn!(email = %user.email, "non-admin hit an admin route; signing out");
    if let Some(token) = bearer_token(headers) {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
    }
    Err(ApiError::Forbidden("admin access required"))
}

async fn open_session(pool: &SqlitePool, user: &User) -> Result<TokenResponse, ApiError> {
    let token = new_id();
    sqlx::query("INSERT INTO sessions (token, user_id, signed_in_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(&user.id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(TokenResponse {
        token,
        profile: profile_of(pool, user).await?,
    })
}

async fn profile_of(pool: &SqlitePool, user: &User) -> Result<ProfileResponse, ApiError> {
    Ok(ProfileResponse {
        id: user.id.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        avatar_url: user.avatar_url.clone(),
        is_admin: is_admin(pool, &user.email).await?,
    })
}

async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.full_name.trim().is_empty() {
        return Err(ApiError::Validation("full name is required".to_string()));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(ApiError::Validation("phone number is required".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let user = User {
        id: new_id(),
        full_name: payload.full_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        password_hash: hash_password(&payload.password)?,
        avatar_url: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, full_name, email, phone, password_hash, avatar_url, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .bind(&user.avatar_url)
    .bind(user.created_at)
    .execute(&state.db)
    .await
    .map_err(|e| on_duplicate(e, "an account with this email"))?;

    info!(email = %user.email, "account registered");
    Ok(Json(open_session(&state.db, &user).await?))
}

async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, full_name, email, phone, password_hash, avatar_url, created_at
         FROM users WHERE email = ? COLLATE NOCASE LIMIT 1",
    )
    .bind(payload.email.trim())
    .fetch_optional(&state.db)
    .await?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized("invalid email or password")),
    };

    Ok(Json(open_session(&state.db, &user).await?))
}

async fn logout(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&state.db)
            .await?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn me(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = current_user(&headers, &state.db).await?;
    Ok(Json(profile_of(&state.db, &user).await?))
}

async fn update_me(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = current_user(&headers, &state.db).await?;

    let full_name = payload.full_name.unwrap_or_else(|| user.full_name.clone());
    if full_name.trim().is_empty() {
        return Err(ApiError::Validation("full name cannot be empty".to_string()));
    }
    let phone = payload.phone.unwrap_or_else(|| user.phone.clone());
    let avatar_url = payload.avatar_url.or_else(|| user.avatar_url.clone());

    sqlx::query("UPDATE users SET full_name = ?, phone = ?, avatar_url = ? WHERE id = ?")
        .bind(full_name.trim())
        .bind(phone.trim())
        .bind(&avatar_url)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    let updated = sqlx::query_as::<_, User>(
        "SELECT id, full_name, email, phone, password_hash, avatar_url, created_at
         FROM users WHERE id = ? LIMIT 1",
    )
    .bind(&user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(profile_of(&state.db, &updated).await?))
}
