//! Request and response payloads.

use chrono::{DateTime, NaiveDate, Utc};
use climon_core::models::tenant::Tenant;
use climon_service::{AlertStatus, IngestOutcome, SensorPayload};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Distinguishes an absent JSON key (no change) from an explicit
/// `null` (clear the field).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// ---------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------

/// Raw sensor submission. Measurements arrive from constrained
/// firmware that sometimes sends numbers as strings, so both forms
/// are accepted.
#[derive(Debug, Deserialize)]
pub struct SubmitDataRequest {
    pub place: Option<String>,
    pub temperature: Option<Value>,
    pub humidity: Option<Value>,
}

fn lenient_number(field: &str, value: Option<&Value>) -> Result<Option<f64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{field} is not a number: '{s}'"))),
        Some(other) => Err(ApiError::BadRequest(format!(
            "{field} must be a number, got {other}"
        ))),
    }
}

impl SubmitDataRequest {
    pub fn into_payload(self) -> Result<SensorPayload, ApiError> {
        Ok(SensorPayload {
            temperature: lenient_number("temperature", self.temperature.as_ref())?,
            humidity: lenient_number("humidity", self.humidity.as_ref())?,
            place: self.place,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitDataResponse {
    pub status: &'static str,
    /// Compound identifier the reading was attributed to.
    pub client: String,
    pub warning: Option<String>,
    /// `sent`, `failed`, or `skipped`.
    pub alert: &'static str,
}

impl From<IngestOutcome> for SubmitDataResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            status: "ok",
            client: outcome.reading.place_id,
            warning: outcome.reading.warning,
            alert: match outcome.alert {
                AlertStatus::Sent => "sent",
                AlertStatus::Failed(_) => "failed",
                AlertStatus::Skipped => "skipped",
            },
        }
    }
}

// ---------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceQuery {
    pub place: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub place: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken
/// as midnight UTC).
pub fn parse_time_bound(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(ApiError::BadRequest(format!(
        "{field} is not a valid timestamp: '{raw}'"
    )))
}

// ---------------------------------------------------------------------
// Client management
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub username: String,
    pub password: String,
    pub place: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub alerts_enabled: bool,
    pub interval_secs: Option<u32>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub place: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    pub alerts_enabled: Option<bool>,
    pub interval_secs: Option<u32>,
    pub password: Option<String>,
}

/// Tenant as exposed over the wire. Credential digests and password
/// hashes never leave the process.
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub username: String,
    pub place: Option<String>,
    pub place_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub alerts_enabled: bool,
    pub interval_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Tenant> for ClientResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            place_id: tenant.place_id(),
            username: tenant.username,
            place: tenant.place,
            display_name: tenant.display_name,
            email: tenant.email,
            phone: tenant.phone,
            address: tenant.address,
            alerts_enabled: tenant.alerts_enabled,
            interval_secs: tenant.interval_secs,
            created_at: tenant.created_at,
        }
    }
}

/// Returned exactly once, at registration or rotation.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub username: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleAlertsResponse {
    pub username: String,
    pub alerts_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
