//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Readings are append-only; the
//! tenant store enforces uniqueness (username, credential digest) via
//! store-level constraints, not application checks.

use chrono::{DateTime, Utc};

use crate::error::ClimonResult;
use crate::models::{
    reading::{NewReading, Reading},
    tenant::{CreateTenant, Tenant, UpdateTenant},
};

/// Optional inclusive time bounds for history queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait TenantRepository: Send + Sync {
    /// Insert a new tenant. A duplicate username or credential digest
    /// trips the store's unique index and surfaces as
    /// `RegistrationFailed`.
    fn create(&self, input: CreateTenant) -> impl Future<Output = ClimonResult<Tenant>> + Send;

    fn get_by_username(&self, username: &str)
    -> impl Future<Output = ClimonResult<Tenant>> + Send;

    /// Credential verification: exact-match lookup by SHA-256 digest.
    fn get_by_api_key_hash(
        &self,
        api_key_hash: &str,
    ) -> impl Future<Output = ClimonResult<Tenant>> + Send;

    /// Legacy no-credential ingestion support: resolve a client by its
    /// exact raw place name.
    fn get_client_by_place(
        &self,
        place: &str,
    ) -> impl Future<Output = ClimonResult<Option<Tenant>>> + Send;

    fn update(
        &self,
        username: &str,
        input: UpdateTenant,
    ) -> impl Future<Output = ClimonResult<Tenant>> + Send;

    fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> impl Future<Output = ClimonResult<()>> + Send;

    /// Credential rotation: replace the stored digest.
    fn set_api_key_hash(
        &self,
        username: &str,
        api_key_hash: &str,
    ) -> impl Future<Output = ClimonResult<()>> + Send;

    /// Flip the alerting opt-in in a single store write and report the
    /// new state. Concurrent toggles each observe a distinct flip.
    fn toggle_alerts(&self, username: &str) -> impl Future<Output = ClimonResult<bool>> + Send;

    /// Hard delete. Historical readings keep their denormalized
    /// `place_id` and remain queryable.
    fn delete(&self, username: &str) -> impl Future<Output = ClimonResult<()>> + Send;

    fn list_clients(&self) -> impl Future<Output = ClimonResult<Vec<Tenant>>> + Send;
}

pub trait ReadingRepository: Send + Sync {
    /// Append one immutable reading, assigning `seq` from an atomic
    /// counter and `recorded_at` from the store clock unless fixed.
    fn insert(&self, input: NewReading) -> impl Future<Output = ClimonResult<Reading>> + Send;

    /// Most-recent reading for one place, ordered by
    /// `recorded_at DESC, seq DESC`.
    fn latest(
        &self,
        place_id: &str,
    ) -> impl Future<Output = ClimonResult<Option<Reading>>> + Send;

    /// Most-recent reading per place, in place order.
    fn latest_per_place(
        &self,
        place_ids: &[String],
    ) -> impl Future<Output = ClimonResult<Vec<Reading>>> + Send;

    /// Full history for one place, newest first.
    fn history(
        &self,
        place_id: &str,
        range: TimeRange,
    ) -> impl Future<Output = ClimonResult<Vec<Reading>>> + Send;
}

pub trait PlaceRepository: Send + Sync {
    /// Record a compound place identifier as seen. Idempotent.
    fn record(&self, place_id: &str) -> impl Future<Output = ClimonResult<()>> + Send;

    /// All compound place identifiers ever observed, sorted.
    fn list(&self) -> impl Future<Output = ClimonResult<Vec<String>>> + Send;
}
