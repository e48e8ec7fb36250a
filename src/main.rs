use std::env;
use std::path::PathBuf;

use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use techmend_be::{app, db, AppState};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/techmend.db".to_string());
    db::ensure_sqlite_dir(&db_url)?;

    let pool = db::connect(&db_url).await?;
    db::run_migrations(&pool).await?;

    let admin_emails = env::var("ADMIN_EMAILS").unwrap_or_default();
    db::seed_defaults(&pool, &admin_emails).await?;

    let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "./storage".to_string()));
    let frontend_dist = env::var("FRONTEND_DIST").unwrap_or_else(|_| "../fe/dist".to_string());

    let state = AppState {
        db: pool,
        upload_dir,
    };

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TechMend backend listening on http://{addr}");

    axum::serve(listener, app(state, &frontend_dist)).await?;
    Ok(())
}
