//! HTTP-level tests over the full route table with an in-memory store.

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum_test::TestServer;
use climon_api::server::create_app;
use climon_api::state::AppState;
use climon_core::models::tenant::{CreateTenant, Role};
use climon_core::repository::TenantRepository;
use climon_db::repository::SurrealTenantRepository;
use climon_db::run_migrations;
use climon_service::credential::hash_api_key;
use climon_service::error::ServiceError;
use climon_service::{AlertTransport, ServiceConfig};
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

const OWNER_KEY: &str = "owner-key";

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
}

impl AlertTransport for RecordingTransport {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

async fn setup() -> (TestServer, RecordingTransport) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();

    // Seed an owner with a known credential.
    SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            username: "owner".into(),
            password_hash: "$argon2id$test".into(),
            role: Role::Owner,
            place: None,
            display_name: None,
            email: None,
            phone: None,
            address: None,
            alerts_enabled: true,
            interval_secs: 10,
            api_key_hash: hash_api_key(OWNER_KEY),
        })
        .await
        .unwrap();

    let transport = RecordingTransport::default();
    let state = AppState::new(db, transport.clone(), ServiceConfig::default());
    let server = TestServer::new(create_app(state)).unwrap();
    (server, transport)
}

/// Register a client through the API and return its issued key.
async fn register_client(server: &TestServer, username: &str, place: &str) -> String {
    let response = server
        .post("/clients")
        .add_header("x-api-key", OWNER_KEY)
        .json(&json!({
            "username": username,
            "password": "hunter2!",
            "place": place,
            "email": format!("{username}@example.com"),
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["api_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_needs_no_credential() {
    let (server, _) = setup().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn client_registration_hands_out_a_key_once() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office 1!!").await;
    assert!(!key.is_empty());

    // The roster never exposes credential material.
    let roster = server
        .get("/export/clients")
        .add_header("x-api-key", OWNER_KEY)
        .await
        .json::<Value>();
    assert_eq!(roster[0]["username"], "acme");
    assert_eq!(roster[0]["place_id"], "acme_office_1");
    assert!(roster[0].get("api_key_hash").is_none());
    assert!(roster[0].get("password_hash").is_none());
}

#[tokio::test]
async fn registration_is_owner_only() {
    let (server, _) = setup().await;
    let client_key = register_client(&server, "acme", "Office").await;

    let response = server
        .post("/clients")
        .add_header("x-api-key", client_key.as_str())
        .json(&json!({ "username": "mole", "password": "hunter2!", "place": "Lab" }))
        .await;
    response.assert_status_forbidden();
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (server, _) = setup().await;
    register_client(&server, "acme", "Office").await;

    let response = server
        .post("/clients")
        .add_header("x-api-key", OWNER_KEY)
        .json(&json!({ "username": "acme", "password": "hunter2!", "place": "Lab" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICT");
}

#[tokio::test]
async fn keyed_submission_stores_and_reports_the_warning() {
    let (server, transport) = setup().await;
    let key = register_client(&server, "acme", "Office 1!!").await;

    // Firmware sends numbers as strings; both forms are accepted.
    let response = server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "place": "Office 1!!", "temperature": "30.0", "humidity": 50 }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["client"], "acme_office_1");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["warning"], "Temperature out of range (30.0°C)");
    assert_eq!(body["alert"], "sent");
    assert_eq!(transport.sent.lock().unwrap().as_slice(), ["acme@example.com"]);
}

#[tokio::test]
async fn non_numeric_measurement_is_a_bad_request() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    let response = server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "place": "Office", "temperature": "warm", "humidity": 50 }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn missing_place_is_a_bad_request() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    let response = server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "temperature": 22, "humidity": 50 }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn unknown_key_is_unauthorized() {
    let (server, _) = setup().await;

    let response = server
        .post("/submit-data")
        .add_header("x-api-key", "bogus")
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn legacy_submission_without_key_lands_under_unknown() {
    let (server, _) = setup().await;

    let response = server
        .post("/submit-data")
        .json(&json!({ "place": "Warehouse B", "temperature": 21, "humidity": 50 }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["client"], "unknown_warehouse_b");
}

#[tokio::test]
async fn latest_data_is_scoped_by_role() {
    let (server, _) = setup().await;
    let acme_key = register_client(&server, "acme", "Office").await;
    let globex_key = register_client(&server, "globex", "Floor 2").await;

    server
        .post("/submit-data")
        .add_header("x-api-key", acme_key.as_str())
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await
        .assert_status_ok();
    server
        .post("/submit-data")
        .add_header("x-api-key", globex_key.as_str())
        .json(&json!({ "place": "Floor 2", "temperature": 22, "humidity": 50 }))
        .await
        .assert_status_ok();

    // Owner wildcard sees one row per place.
    let all = server
        .get("/latest-data")
        .add_query_param("place", "All")
        .add_header("x-api-key", OWNER_KEY)
        .await
        .json::<Value>();
    assert_eq!(all.as_array().unwrap().len(), 2);

    // A client sees its own place and nothing else.
    server
        .get("/latest-data")
        .add_query_param("place", "acme_office")
        .add_header("x-api-key", acme_key.as_str())
        .await
        .assert_status_ok();
    server
        .get("/latest-data")
        .add_query_param("place", "globex_floor_2")
        .add_header("x-api-key", acme_key.as_str())
        .await
        .assert_status_forbidden();
    server
        .get("/latest-data")
        .add_query_param("place", "All")
        .add_header("x-api-key", acme_key.as_str())
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn export_renders_display_zone_timestamps() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await
        .assert_status_ok();

    let rows = server
        .get("/export")
        .add_query_param("place", "acme_office")
        .add_header("x-api-key", key.as_str())
        .await
        .json::<Value>();
    let recorded_at = rows[0]["recorded_at"].as_str().unwrap();
    // `YYYY-MM-DD HH:MM:SS` in the display zone, not RFC 3339.
    assert_eq!(recorded_at.len(), 19);
    assert!(!recorded_at.contains('T'));
}

#[tokio::test]
async fn bad_time_bound_is_rejected() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    server
        .get("/history")
        .add_query_param("place", "acme_office")
        .add_query_param("from", "yesterday")
        .add_header("x-api-key", key.as_str())
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn rotation_invalidates_the_old_key() {
    let (server, _) = setup().await;
    let old_key = register_client(&server, "acme", "Office").await;

    let response = server
        .post("/clients/acme/rotate-key")
        .add_header("x-api-key", OWNER_KEY)
        .await;
    response.assert_status_ok();
    let new_key = response.json::<Value>()["api_key"].as_str().unwrap().to_string();

    server
        .post("/submit-data")
        .add_header("x-api-key", old_key.as_str())
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await
        .assert_status_unauthorized();
    server
        .post("/submit-data")
        .add_header("x-api-key", new_key.as_str())
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn toggle_alerts_acts_on_the_caller() {
    let (server, transport) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    let response = server
        .post("/toggle-alerts")
        .add_header("x-api-key", key.as_str())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["alerts_enabled"], false);

    // Out-of-range readings no longer mail anyone.
    let body = server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "place": "Office", "temperature": 30, "humidity": 50 }))
        .await
        .json::<Value>();
    assert_eq!(body["alert"], "skipped");
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_and_delete_clients() {
    let (server, _) = setup().await;
    let key = register_client(&server, "acme", "Office").await;

    let response = server
        .put("/clients/acme")
        .add_header("x-api-key", OWNER_KEY)
        .json(&json!({ "display_name": "Acme Ltd", "email": null }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["display_name"], "Acme Ltd");
    assert_eq!(body["email"], Value::Null);
    assert_eq!(body["place_id"], "acme_ltd_office");

    server
        .delete("/clients/acme")
        .add_header("x-api-key", OWNER_KEY)
        .await
        .assert_status_ok();
    server
        .post("/submit-data")
        .add_header("x-api-key", key.as_str())
        .json(&json!({ "place": "Office", "temperature": 21, "humidity": 50 }))
        .await
        .assert_status_unauthorized();
}
