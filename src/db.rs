use std::{fs, path::Path, str::FromStr};

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::settings::{self, GeneralSettings, ServicesSettings};
use crate::catalog;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// The sqlite file's parent directory has to exist before connect.
pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));
    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool, admin_emails: &str) -> Result<(), sqlx::Error> {
    seed_admins(pool, admin_emails).await?;
    seed_settings(pool).await?;
    let (inserted, _) = seed_device_models(pool).await?;
    if inserted > 0 {
        info!(inserted, "seeded device model catalog");
    }
    Ok(())
}

async fn seed_admins(pool: &SqlitePool, admin_emails: &str) -> Result<(), sqlx::Error> {
    let emails: Vec<String> = admin_emails
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    if emails.is_empty() {
        warn!("ADMIN_EMAILS not set; no admin account will pass the allow-list");
        return Ok(());
    }

    for email in emails {
        sqlx::query("INSERT OR IGNORE INTO admin_users (email, created_at) VALUES (?, ?)")
            .bind(email)
            .bind(Utc::now())
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let defaults = [
        (
            settings::KEY_GENERAL,
            serde_json::to_string(&GeneralSettings::default()).unwrap_or_default(),
        ),
        (
            settings::KEY_SERVICES,
            serde_json::to_string(&ServicesSettings::default()).unwrap_or_default(),
        ),
    ];

    for (key, value) in defaults {
        let exists =
            sqlx::query_as::<_, (String,)>("SELECT key FROM site_settings WHERE key = ? LIMIT 1")
                .bind(key)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query("INSERT INTO site_settings (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Plant the static device tree into `device_models`. Skip-if-exists by
/// (brand, model), so running it again inserts nothing.
pub async fn seed_device_models(pool: &SqlitePool) -> Result<(u64, u64), sqlx::Error> {
    let mut inserted = 0u64;
    let mut skipped = 0u64;

    for (category, brand, model) in catalog::seed_rows() {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO device_models (id, category, brand, model, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(category)
        .bind(brand)
        .bind(model)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    Ok((inserted, skipped))
}
