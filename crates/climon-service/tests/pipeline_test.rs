//! End-to-end ingestion pipeline tests against an in-memory store and
//! a recording mail transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use climon_core::ClimonError;
use climon_core::models::tenant::{CreateTenant, Role};
use climon_core::repository::{PlaceRepository, ReadingRepository, TenantRepository};
use climon_db::repository::{
    SurrealPlaceRepository, SurrealReadingRepository, SurrealTenantRepository,
};
use climon_db::run_migrations;
use climon_service::credential::hash_api_key;
use climon_service::error::ServiceError;
use climon_service::{AlertStatus, AlertTransport, IngestService, SensorPayload, ServiceConfig};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

const API_KEY: &str = "test-key-acme";

#[derive(Debug, Clone, PartialEq)]
struct SentMail {
    to: String,
    subject: String,
    body: String,
}

/// Records outbound mail instead of sending it; optionally fails or
/// stalls to exercise the best-effort dispatch path.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail: Arc<AtomicBool>,
    stall: Arc<AtomicBool>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

impl AlertTransport for RecordingTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Dispatch("SMTP refused".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        });
        Ok(())
    }
}

type TestIngest = IngestService<
    SurrealTenantRepository<Db>,
    SurrealReadingRepository<Db>,
    SurrealPlaceRepository<Db>,
    RecordingTransport,
>;

struct Harness {
    ingest: TestIngest,
    transport: RecordingTransport,
    readings: SurrealReadingRepository<Db>,
    places: SurrealPlaceRepository<Db>,
    tenants: SurrealTenantRepository<Db>,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();

    let tenants = SurrealTenantRepository::new(db.clone());
    let readings = SurrealReadingRepository::new(db.clone());
    let places = SurrealPlaceRepository::new(db);
    let transport = RecordingTransport::default();

    let ingest = IngestService::new(
        tenants.clone(),
        readings.clone(),
        places.clone(),
        transport.clone(),
        ServiceConfig::default(),
    );
    Harness {
        ingest,
        transport,
        readings,
        places,
        tenants,
    }
}

async fn register_acme(tenants: &SurrealTenantRepository<Db>, alerts_enabled: bool) {
    tenants
        .create(CreateTenant {
            username: "acme".into(),
            password_hash: "$argon2id$test".into(),
            role: Role::Client,
            place: Some("Office 1!!".into()),
            display_name: None,
            email: Some("ops@acme.example".into()),
            phone: None,
            address: None,
            alerts_enabled,
            interval_secs: 10,
            api_key_hash: hash_api_key(API_KEY),
        })
        .await
        .unwrap();
}

fn payload(temperature: f64, humidity: f64) -> SensorPayload {
    SensorPayload {
        place: Some("Office 1!!".into()),
        temperature: Some(temperature),
        humidity: Some(humidity),
    }
}

#[tokio::test]
async fn in_range_reading_is_stored_without_alert() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h.ingest.ingest(API_KEY, payload(21.0, 50.0)).await.unwrap();

    assert_eq!(outcome.reading.place_id, "acme_office_1");
    assert_eq!(outcome.reading.place, "office_1");
    assert_eq!(outcome.reading.warning, None);
    assert_eq!(outcome.alert, AlertStatus::Skipped);
    assert!(h.transport.sent().is_empty());

    // The compound place is registered as known.
    assert_eq!(h.places.list().await.unwrap(), vec!["acme_office_1"]);
}

#[tokio::test]
async fn out_of_range_reading_sends_alert() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h.ingest.ingest(API_KEY, payload(30.0, 80.0)).await.unwrap();

    assert_eq!(
        outcome.reading.warning.as_deref(),
        Some("Temperature out of range (30.0°C); Humidity out of range (80.0%)")
    );
    assert_eq!(outcome.alert, AlertStatus::Sent);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@acme.example");
    assert_eq!(sent[0].subject, "Alert: acme_office_1 readings out of range");
    assert!(sent[0].body.contains("Temperature: 30"));
}

#[tokio::test]
async fn payload_place_may_differ_from_registered_place() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h
        .ingest
        .ingest(
            API_KEY,
            SensorPayload {
                place: Some("Server Room".into()),
                temperature: Some(21.0),
                humidity: Some(50.0),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.reading.place_id, "acme_server_room");
}

#[tokio::test]
async fn missing_place_is_malformed_and_stores_nothing() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let err = h
        .ingest
        .ingest(
            API_KEY,
            SensorPayload {
                place: None,
                temperature: Some(22.0),
                humidity: Some(50.0),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClimonError::MalformedRequest { .. }), "got {err:?}");
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_credential_stores_nothing() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let err = h.ingest.ingest("wrong-key", payload(30.0, 80.0)).await.unwrap_err();

    assert!(matches!(err, ClimonError::Unauthorized), "got {err:?}");
    assert!(h.transport.sent().is_empty());
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_measurement_is_malformed_and_stores_nothing() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let err = h
        .ingest
        .ingest(
            API_KEY,
            SensorPayload {
                place: Some("Office 1!!".into()),
                temperature: Some(21.0),
                humidity: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClimonError::MalformedRequest { .. }), "got {err:?}");
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_none());
}

#[tokio::test]
async fn disabled_alerts_store_the_reading_but_skip_dispatch() {
    let h = setup().await;
    register_acme(&h.tenants, false).await;

    let outcome = h.ingest.ingest(API_KEY, payload(30.0, 50.0)).await.unwrap();

    assert!(outcome.reading.warning.is_some());
    assert_eq!(outcome.alert, AlertStatus::Skipped);
    assert!(h.transport.sent().is_empty());
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_some());
}

#[tokio::test]
async fn transport_failure_does_not_lose_the_reading() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;
    h.transport.fail.store(true, Ordering::SeqCst);

    let outcome = h.ingest.ingest(API_KEY, payload(30.0, 50.0)).await.unwrap();

    assert!(matches!(outcome.alert, AlertStatus::Failed(_)));
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn stalled_transport_times_out_as_failed() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;
    h.transport.stall.store(true, Ordering::SeqCst);

    let outcome = h.ingest.ingest(API_KEY, payload(30.0, 50.0)).await.unwrap();

    match outcome.alert {
        AlertStatus::Failed(reason) => assert!(reason.contains("timed out")),
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert!(h.readings.latest("acme_office_1").await.unwrap().is_some());
}

#[tokio::test]
async fn legacy_submission_attributes_by_registered_place() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h
        .ingest
        .ingest_legacy(SensorPayload {
            place: Some("Office 1!!".into()),
            temperature: Some(30.0),
            humidity: Some(50.0),
        })
        .await
        .unwrap();

    assert_eq!(outcome.reading.place_id, "acme_office_1");
    // Attribution also wires up alerting.
    assert_eq!(outcome.alert, AlertStatus::Sent);
}

#[tokio::test]
async fn legacy_submission_with_compound_place_is_attributed() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h
        .ingest
        .ingest_legacy(SensorPayload {
            place: Some("acme_office_1".into()),
            temperature: Some(30.0),
            humidity: Some(50.0),
        })
        .await
        .unwrap();

    assert_eq!(outcome.reading.place_id, "acme_office_1");
    assert_eq!(outcome.reading.place, "office_1");
    assert_eq!(outcome.alert, AlertStatus::Sent);
}

#[tokio::test]
async fn legacy_compound_place_matches_on_client_prefix() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    // A compound name for a place this client never registered still
    // attributes to the client whose prefix it carries.
    let outcome = h
        .ingest
        .ingest_legacy(SensorPayload {
            place: Some("acme_server_room".into()),
            temperature: Some(30.0),
            humidity: Some(50.0),
        })
        .await
        .unwrap();

    assert_eq!(outcome.reading.place_id, "acme_server_room");
    assert_eq!(outcome.reading.place, "server_room");
    assert_eq!(outcome.alert, AlertStatus::Sent);
}

#[tokio::test]
async fn legacy_submission_for_unregistered_place_goes_to_unknown() {
    let h = setup().await;
    register_acme(&h.tenants, true).await;

    let outcome = h
        .ingest
        .ingest_legacy(SensorPayload {
            place: Some("Warehouse B".into()),
            temperature: Some(30.0),
            humidity: Some(50.0),
        })
        .await
        .unwrap();

    assert_eq!(outcome.reading.place_id, "unknown_warehouse_b");
    assert_eq!(outcome.alert, AlertStatus::Skipped);
    assert!(h.transport.sent().is_empty());
}
