//! Reading ingestion pipeline.
//!
//! One submission flows through credential resolution, payload
//! validation, place naming, comfort evaluation, persistence, and
//! best-effort alert dispatch, in that order. Persistence happens
//! before dispatch so a broken mail path never loses data.

use climon_core::models::reading::{NewReading, Reading};
use climon_core::models::tenant::Tenant;
use climon_core::repository::{PlaceRepository, ReadingRepository, TenantRepository};
use climon_core::slug;
use climon_core::{ClimonError, ClimonResult};
use tracing::{debug, info, warn};

use crate::alert::{AlertDispatcher, AlertTransport};
use crate::config::ServiceConfig;
use crate::credential::hash_api_key;
use crate::error::ServiceError;

/// One sensor submission, before validation. All fields optional so
/// the transport layer can hand payloads over as-is and let the
/// pipeline reject them uniformly.
#[derive(Debug, Clone, Default)]
pub struct SensorPayload {
    pub place: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// What happened to the alert leg of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertStatus {
    /// Readings were in range, alerts are disabled, or the tenant has
    /// no email on file.
    Skipped,
    Sent,
    /// Dispatch was attempted and failed or timed out. The reading is
    /// stored regardless.
    Failed(String),
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub alert: AlertStatus,
}

pub struct IngestService<TR, RR, PR, T> {
    tenants: TR,
    readings: RR,
    places: PR,
    transport: T,
    config: ServiceConfig,
}

impl<TR, RR, PR, T> IngestService<TR, RR, PR, T>
where
    TR: TenantRepository,
    RR: ReadingRepository,
    PR: PlaceRepository,
    T: AlertTransport,
{
    pub fn new(tenants: TR, readings: RR, places: PR, transport: T, config: ServiceConfig) -> Self {
        Self {
            tenants,
            readings,
            places,
            transport,
            config,
        }
    }

    /// Ingest one credentialed submission.
    ///
    /// The credential is resolved to a tenant before anything else;
    /// nothing is persisted for an unknown key.
    pub async fn ingest(
        &self,
        api_key: &str,
        payload: SensorPayload,
    ) -> ClimonResult<IngestOutcome> {
        // 1. Resolve the credential by digest. An unknown key is
        //    reported as unauthorized, never as not-found.
        let tenant = match self.tenants.get_by_api_key_hash(&hash_api_key(api_key)).await {
            Ok(tenant) => tenant,
            Err(ClimonError::NotFound { .. }) => {
                return Err(ServiceError::InvalidCredential.into());
            }
            Err(e) => return Err(e),
        };

        // 2. Validate the payload. A missing or blank place is rejected
        //    outright; the registered place is never substituted.
        let place = payload
            .place
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::Malformed("place is required".into()))?
            .to_string();
        let (temperature, humidity) = required_measurements(&payload)?;

        // 3. Derive the tenant-scoped compound place identifier.
        let place_id = slug::compound(tenant.handle(), &place);

        self.store_and_notify(Some(&tenant), place_id, place, temperature, humidity)
            .await
    }

    /// Ingest one legacy, uncredentialed submission.
    ///
    /// The place name alone identifies the sender. Pre-credential
    /// firmware sends either the bare registered place or the full
    /// compound `tenant_place` identifier, so both forms are matched;
    /// anything else is stored under an `unknown_` prefix and no
    /// alerting is attempted.
    pub async fn ingest_legacy(&self, payload: SensorPayload) -> ClimonResult<IngestOutcome> {
        let place = payload
            .place
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::Malformed("place is required".into()))?
            .to_string();
        let (temperature, humidity) = required_measurements(&payload)?;

        let (tenant, place_id, place) = self.attribute_legacy(place).await?;
        self.store_and_notify(tenant.as_ref(), place_id, place, temperature, humidity)
            .await
    }

    /// Resolve the sender of a legacy submission from its place string.
    ///
    /// Returns the matched client (if any), the compound identifier to
    /// file the reading under, and the bare place name.
    async fn attribute_legacy(
        &self,
        place: String,
    ) -> ClimonResult<(Option<Tenant>, String, String)> {
        // Exact match on a registered place name.
        if let Some(tenant) = self.tenants.get_client_by_place(&place).await? {
            let place_id = slug::compound(tenant.handle(), &place);
            return Ok((Some(tenant), place_id, place));
        }

        // The supplied place may itself be a compound identifier
        // carrying a registered client's prefix.
        let slug = slug::normalize(&place);
        for tenant in self.tenants.list_clients().await? {
            let prefix = format!("{}_", slug::normalize(tenant.handle()));
            if let Some(rest) = slug.strip_prefix(&prefix) {
                if !rest.is_empty() {
                    let bare = rest.to_string();
                    return Ok((Some(tenant), slug, bare));
                }
            }
        }

        debug!(place, "No client matches place, storing as unknown");
        let place_id = format!("unknown_{slug}");
        Ok((None, place_id, place))
    }

    async fn store_and_notify(
        &self,
        tenant: Option<&Tenant>,
        place_id: String,
        place: String,
        temperature: f64,
        humidity: f64,
    ) -> ClimonResult<IngestOutcome> {
        // 4. Evaluate against the comfort bands.
        let warning = self.config.comfort.evaluate(temperature, humidity);
        let place = slug::normalize(&place);

        // 5. Persist the place and the reading. The reading is durable
        //    from here on, whatever the alert leg does.
        self.places.record(&place_id).await?;
        let reading = self
            .readings
            .insert(NewReading {
                place_id: place_id.clone(),
                place,
                temperature,
                humidity,
                warning: warning.clone(),
                recorded_at: None,
            })
            .await?;
        info!(
            place_id,
            seq = reading.seq,
            temperature,
            humidity,
            out_of_range = warning.is_some(),
            "Reading stored"
        );

        // 6. Best-effort alert dispatch, bounded by the configured
        //    timeout. Failures are reported in the outcome, never as
        //    an error.
        let alert = match (&warning, tenant) {
            (Some(w), Some(t)) if t.alerts_enabled => match &t.email {
                Some(email) => self.dispatch_alert(email, &place_id, temperature, humidity, w).await,
                None => {
                    debug!(place_id, "Alerts enabled but no email on file");
                    AlertStatus::Skipped
                }
            },
            _ => AlertStatus::Skipped,
        };

        Ok(IngestOutcome { reading, alert })
    }

    async fn dispatch_alert(
        &self,
        email: &str,
        place_id: &str,
        temperature: f64,
        humidity: f64,
        warning: &str,
    ) -> AlertStatus {
        let dispatcher = AlertDispatcher::new(&self.config);
        let attempt = dispatcher.dispatch(
            &self.transport,
            email,
            place_id,
            temperature,
            humidity,
            warning,
        );
        match tokio::time::timeout(self.config.alert_timeout, attempt).await {
            Ok(Ok(())) => AlertStatus::Sent,
            Ok(Err(e)) => AlertStatus::Failed(e.to_string()),
            Err(_) => {
                warn!(place_id, "Alert dispatch timed out");
                AlertStatus::Failed("dispatch timed out".into())
            }
        }
    }
}

fn required_measurements(payload: &SensorPayload) -> Result<(f64, f64), ClimonError> {
    let temperature = payload
        .temperature
        .ok_or_else(|| ServiceError::Malformed("temperature is required".into()))?;
    let humidity = payload
        .humidity
        .ok_or_else(|| ServiceError::Malformed("humidity is required".into()))?;
    if !temperature.is_finite() || !humidity.is_finite() {
        return Err(ServiceError::Malformed("measurements must be finite numbers".into()).into());
    }
    Ok((temperature, humidity))
}
