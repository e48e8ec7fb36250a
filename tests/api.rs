use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use techmend_be::{app, db, AppState};

const ADMIN_EMAIL: &str = "admin@techmend.example";
const PASSWORD: &str = "S3curePass!";

struct TestApp {
    base_url: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let temp_id = Uuid::new_v4();
    let db_url = format!("sqlite://target/test-data/{temp_id}/techmend.db");
    db::ensure_sqlite_dir(&db_url)?;

    let pool = db::connect(&db_url).await?;
    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, ADMIN_EMAIL).await?;

    let state = AppState {
        db: pool,
        upload_dir: PathBuf::from(format!("target/test-data/{temp_id}/storage")),
    };
    let router = app(state, "target/test-data/no-frontend");

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server error: {e}");
        }
    });

    Ok(TestApp {
        base_url: format!("http://{}:{}", addr.ip(), addr.port()),
    })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Register an account and return its bearer token.
async fn register(app: &TestApp, email: &str) -> anyhow::Result<String> {
    let res = client()
        .post(app.url("/api/register"))
        .json(&json!({
            "full_name": "Sam Doe",
            "email": email,
            "phone": "555-0101",
            "password": PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

fn booking_payload() -> Value {
    json!({
        "service_label": "Screen Repair",
        "device_category": "Phone",
        "device_brand": "Apple",
        "device_model": "iPhone 15",
        "appointment_date": "2025-06-01",
        "appointment_time": "10:00 AM",
    })
}

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(app.url("/api/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_me_round_trip() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let token = register(&app, &email).await?;

    let res = client()
        .get(app.url("/api/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?;
    assert_eq!(profile["email"], email.as_str());
    assert_eq!(profile["is_admin"], false);

    // Fresh login issues a new session.
    let res = client()
        .post(app.url("/api/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Wrong password is a 401, not a 500.
    let res = client()
        .post(app.url("/api/login"))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    register(&app, &email).await?;

    let res = client()
        .post(app.url("/api/register"))
        .json(&json!({
            "full_name": "Sam Again",
            "email": email.to_uppercase(),
            "phone": "555-0102",
            "password": PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn booking_without_session_is_rejected() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client()
        .post(app.url("/api/bookings"))
        .json(&booking_payload())
        .send()
        .await?;
    // The wizard's Contact step: unauthenticated submissions go to login.
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn authenticated_booking_reaches_confirmation() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let token = register(&app, &email).await?;

    let res = client()
        .post(app.url("/api/bookings"))
        .bearer_auth(&token)
        .json(&booking_payload())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;

    assert_eq!(body["step"], 5);
    assert_eq!(body["booking"]["status"], "received");
    assert_eq!(body["booking"]["customer_email"], email.as_str());
    assert_eq!(body["booking"]["device_model"], "iPhone 15");
    assert_eq!(body["booking"]["appointment_time"], "10:00 AM");

    // Exactly one row, visible in the caller's own list.
    let res = client()
        .get(app.url("/api/bookings"))
        .bearer_auth(&token)
        .send()
        .await?;
    let list = res.json::<Value>().await?;
    assert_eq!(list["total"], 1);
    Ok(())
}

#[tokio::test]
async fn booking_guards_name_their_missing_step() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let token = register(&app, &email).await?;

    let mut no_service = booking_payload();
    no_service["service_label"] = json!("");
    let res = client()
        .post(app.url("/api/bookings"))
        .bearer_auth(&token)
        .json(&no_service)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut no_time = booking_payload();
    no_time["appointment_time"] = json!("");
    let res = client()
        .post(app.url("/api/bookings"))
        .bearer_auth(&token)
        .json(&no_time)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut bad_time = booking_payload();
    bad_time["appointment_time"] = json!("25:99");
    let res = client()
        .post(app.url("/api/bookings"))
        .bearer_auth(&token)
        .json(&bad_time)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_updates_and_deletes_bookings() -> anyhow::Result<()> {
    let app = start_server().await?;
    let customer = format!("user_{}@example.com", Uuid::new_v4());
    let customer_token = register(&app, &customer).await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    let res = client()
        .post(app.url("/api/bookings"))
        .bearer_auth(&customer_token)
        .json(&booking_payload())
        .send()
        .await?;
    let booking_id = res.json::<Value>().await?["booking"]["id"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    // Status/cost/notes are the only editable fields.
    let res = client()
        .put(app.url(&format!("/api/bookings/{booking_id}")))
        .bearer_auth(&admin_token)
        .json(&json!({ "status": "diagnosing", "estimated_cost": 89.0, "notes": "cracked glass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["status"], "diagnosing");
    assert_eq!(updated["estimated_cost"], 89.0);
    assert_eq!(updated["customer_email"], customer.as_str());

    // Unknown status is rejected before any write.
    let res = client()
        .put(app.url(&format!("/api/bookings/{booking_id}")))
        .bearer_auth(&admin_token)
        .json(&json!({ "status": "vaporized" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client()
        .delete(app.url(&format!("/api/bookings/{booking_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client()
        .delete(app.url(&format!("/api/bookings/{booking_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_admin_is_signed_out_on_admin_route() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let token = register(&app, &email).await?;

    let res = client()
        .get(app.url("/api/bookings/all"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The session was revoked, not just refused.
    let res = client()
        .get(app.url("/api/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn service_labels_come_from_menu_and_stay_unique() -> anyhow::Result<()> {
    let app = start_server().await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    // Not in the menu yet.
    let res = client()
        .post(app.url("/api/services"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "label": "Screen Repair", "price": "From $89", "duration": "1 hour", "icon": "screen",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client()
        .post(app.url("/api/menu-items"))
        .bearer_auth(&admin_token)
        .json(&json!({ "label": "Screen Repair" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client()
        .post(app.url("/api/services"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "label": "Screen Repair", "price": "From $89", "duration": "1 hour", "icon": "screen",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Case-insensitive duplicate is refused and the list is unchanged.
    let res = client()
        .post(app.url("/api/services"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "label": "SCREEN REPAIR", "price": "From $99", "duration": "2 hours", "icon": "screen",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client().get(app.url("/api/services")).send().await?;
    let services = res.json::<Value>().await?;
    assert_eq!(services.as_array().map(Vec::len), Some(1));

    // Unknown icon key is a validation error, not a fallback icon.
    let res = client()
        .post(app.url("/api/menu-items"))
        .bearer_auth(&admin_token)
        .json(&json!({ "label": "Battery Swap" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client()
        .post(app.url("/api/services"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "label": "Battery Swap", "price": "From $49", "duration": "30 min", "icon": "sparkles",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn device_tree_merges_and_looks_up() -> anyhow::Result<()> {
    let app = start_server().await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    let res = client()
        .get(app.url("/api/device-models/lookup?model=iPhone%2015"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let found = res.json::<Value>().await?;
    assert_eq!(found["category"], "Phone");
    assert_eq!(found["brand"], "Apple");

    let res = client()
        .post(app.url("/api/device-models"))
        .bearer_auth(&admin_token)
        .json(&json!({ "category": "Drone", "brand": "DJI", "model": "Mini 4 Pro" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client().get(app.url("/api/device-models/tree")).send().await?;
    let tree = res.json::<Value>().await?;
    assert!(tree["Phone"]["Apple"]
        .as_array()
        .map(|models| models.iter().any(|m| m == "iPhone 15"))
        .unwrap_or(false));
    assert!(tree["Drone"]["DJI"]
        .as_array()
        .map(|models| models.iter().any(|m| m == "Mini 4 Pro"))
        .unwrap_or(false));

    let res = client()
        .get(app.url("/api/device-models/lookup?model=UnknownPhone"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn device_seed_is_idempotent() -> anyhow::Result<()> {
    let app = start_server().await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    // Startup already planted the seed; running it again adds nothing.
    let res = client()
        .post(app.url("/api/device-models/seed"))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["inserted"], 0);
    assert!(body["skipped"].as_u64().unwrap_or(0) > 0);
    Ok(())
}

#[tokio::test]
async fn tickets_are_gated_and_stamped_with_identity() -> anyhow::Result<()> {
    let app = start_server().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let token = register(&app, &email).await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    let res = client()
        .post(app.url("/api/tickets"))
        .json(&json!({ "name": "Sam", "subject": "Help", "message": "My phone is sad." }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .post(app.url("/api/tickets"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Sam", "subject": "Help", "message": "My phone is sad." }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let ticket = res.json::<Value>().await?;
    assert_eq!(ticket["email"], email.as_str());

    let res = client()
        .get(app.url("/api/tickets?q=help"))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let tickets = res.json::<Value>().await?;
    assert_eq!(tickets.as_array().map(Vec::len), Some(1));

    let ticket_id = tickets[0]["id"].as_str().unwrap_or_default().to_string();
    let res = client()
        .delete(app.url(&format!("/api/tickets/{ticket_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn settings_round_trip_with_validation() -> anyhow::Result<()> {
    let app = start_server().await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    let res = client().get(app.url("/api/settings/general")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let mut general = res.json::<Value>().await?;
    assert_eq!(general["shop_name"], "TechMend");

    general["shop_name"] = json!("TechMend North");
    general["is_open"] = json!(false);
    let res = client()
        .put(app.url("/api/settings/general"))
        .bearer_auth(&admin_token)
        .json(&general)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client().get(app.url("/api/settings/general")).send().await?;
    let reread = res.json::<Value>().await?;
    assert_eq!(reread["shop_name"], "TechMend North");
    assert_eq!(reread["is_open"], false);

    // Garbage payloads and unknown keys are refused.
    let res = client()
        .put(app.url("/api/settings/general"))
        .bearer_auth(&admin_token)
        .json(&json!({ "bogus": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client().get(app.url("/api/settings/secrets")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn inventory_crud_and_search() -> anyhow::Result<()> {
    let app = start_server().await?;
    let admin_token = register(&app, ADMIN_EMAIL).await?;

    let res = client()
        .post(app.url("/api/inventory"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "title": "iPhone 13 128GB",
            "brand": "Apple",
            "category": "Phone",
            "price": 429.0,
            "condition": "Refurbished",
            "storage": "128GB",
            "color": "Midnight",
            "quantity": 3,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let item = res.json::<Value>().await?;
    assert_eq!(item["status"], "available");
    let item_id = item["id"].as_str().unwrap_or_default().to_string();

    let res = client().get(app.url("/api/inventory?q=iphone")).send().await?;
    let hits = res.json::<Value>().await?;
    assert_eq!(hits.as_array().map(Vec::len), Some(1));

    let res = client().get(app.url("/api/inventory?q=galaxy")).send().await?;
    let misses = res.json::<Value>().await?;
    assert_eq!(misses.as_array().map(Vec::len), Some(0));

    let res = client()
        .put(app.url(&format!("/api/inventory/{item_id}")))
        .bearer_auth(&admin_token)
        .json(&json!({ "status": "out_of_stock", "quantity": 0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["status"], "out_of_stock");
    assert_eq!(updated["title"], "iPhone 13 128GB");

    let res = client()
        .delete(app.url(&format!("/api/inventory/{item_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
