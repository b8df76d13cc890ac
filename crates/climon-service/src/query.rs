//! Access-scoped read queries over stored readings.
//!
//! Scope is resolved before any data is fetched: an owner sees every
//! known place, a client sees exactly its own compound place
//! identifier. Requests outside the caller's scope fail closed.

use chrono::{DateTime, Utc};
use climon_core::models::reading::Reading;
use climon_core::models::tenant::{Role, Tenant};
use climon_core::repository::{PlaceRepository, ReadingRepository, TenantRepository, TimeRange};
use climon_core::{ClimonError, ClimonResult};
use serde::Serialize;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// What the caller asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceSelector {
    /// Every place in the caller's scope. Owner-only.
    All,
    One(String),
}

impl PlaceSelector {
    /// Parse the wire form: the literal `All` is the wildcard, any
    /// other non-empty string names one place identifier.
    pub fn parse(raw: &str) -> ClimonResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ServiceError::Malformed("place is required".into()).into());
        }
        if raw == "All" {
            Ok(Self::All)
        } else {
            Ok(Self::One(raw.to_string()))
        }
    }
}

/// One reading rendered for the export surface: timestamps converted
/// to the display zone, stable field order for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    pub place_id: String,
    pub place: String,
    pub temperature: f64,
    pub humidity: f64,
    pub warning: Option<String>,
    pub recorded_at: String,
}

pub struct QueryService<TR, RR, PR> {
    tenants: TR,
    readings: RR,
    places: PR,
    config: ServiceConfig,
}

impl<TR, RR, PR> QueryService<TR, RR, PR>
where
    TR: TenantRepository,
    RR: ReadingRepository,
    PR: PlaceRepository,
{
    pub fn new(tenants: TR, readings: RR, places: PR, config: ServiceConfig) -> Self {
        Self {
            tenants,
            readings,
            places,
            config,
        }
    }

    /// The place identifiers this tenant may read.
    pub async fn allowed_places(&self, tenant: &Tenant) -> ClimonResult<Vec<String>> {
        match tenant.role {
            Role::Owner => self.places.list().await,
            Role::Client => Ok(tenant.place_id().into_iter().collect()),
        }
    }

    /// Latest reading per selected place, in place order.
    ///
    /// Places with no readings yet are omitted from the result.
    pub async fn latest(
        &self,
        tenant: &Tenant,
        selector: &PlaceSelector,
    ) -> ClimonResult<Vec<ReadingView>> {
        let place_ids = self.resolve_scope(tenant, selector).await?;
        debug!(username = %tenant.username, places = place_ids.len(), "Latest-data query");
        let rows = self.readings.latest_per_place(&place_ids).await?;
        Ok(rows.into_iter().map(|r| self.render(r)).collect())
    }

    /// Full history across the selected places, newest first within
    /// each place, optionally bounded.
    pub async fn history(
        &self,
        tenant: &Tenant,
        selector: &PlaceSelector,
        range: TimeRange,
    ) -> ClimonResult<Vec<ReadingView>> {
        let place_ids = self.resolve_scope(tenant, selector).await?;
        let mut views = Vec::new();
        for place_id in &place_ids {
            let rows = self.readings.history(place_id, range).await?;
            views.extend(rows.into_iter().map(|r| self.render(r)));
        }
        Ok(views)
    }

    /// Same rows as [`Self::history`]; kept as the export surface's
    /// entry point.
    pub async fn export(
        &self,
        tenant: &Tenant,
        selector: &PlaceSelector,
        range: TimeRange,
    ) -> ClimonResult<Vec<ReadingView>> {
        self.history(tenant, selector, range).await
    }

    /// Client roster for export. Owner-only.
    pub async fn export_clients(&self, tenant: &Tenant) -> ClimonResult<Vec<Tenant>> {
        if tenant.role != Role::Owner {
            return Err(ClimonError::Forbidden {
                reason: "client listing is restricted to the owner".into(),
            });
        }
        self.tenants.list_clients().await
    }

    /// Render a stored UTC timestamp in the display zone.
    pub fn display_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.config.display_tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    fn render(&self, reading: Reading) -> ReadingView {
        ReadingView {
            recorded_at: self.display_time(reading.recorded_at),
            place_id: reading.place_id,
            place: reading.place,
            temperature: reading.temperature,
            humidity: reading.humidity,
            warning: reading.warning,
        }
    }

    async fn resolve_scope(
        &self,
        tenant: &Tenant,
        selector: &PlaceSelector,
    ) -> ClimonResult<Vec<String>> {
        match selector {
            PlaceSelector::All => match tenant.role {
                Role::Owner => self.places.list().await,
                Role::Client => Err(ClimonError::Forbidden {
                    reason: "the All selector is restricted to the owner".into(),
                }),
            },
            PlaceSelector::One(place_id) => {
                self.check_scope(tenant, place_id).await?;
                Ok(vec![place_id.clone()])
            }
        }
    }

    async fn check_scope(&self, tenant: &Tenant, place_id: &str) -> ClimonResult<()> {
        let allowed = match tenant.role {
            Role::Owner => true,
            Role::Client => tenant.place_id().as_deref() == Some(place_id),
        };
        if allowed {
            Ok(())
        } else {
            Err(ClimonError::Forbidden {
                reason: format!("place '{place_id}' is outside this tenant's scope"),
            })
        }
    }
}
