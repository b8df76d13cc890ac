//! Sensor reading domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted sensor reading. Immutable once created; written only by
/// the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    /// Monotonic insert sequence. Orders readings with identical
    /// `recorded_at` timestamps.
    pub seq: u64,
    /// Compound `tenant_place` identifier. Denormalized text, not a
    /// foreign key — it outlives tenant deletion.
    pub place_id: String,
    /// Bare place slug.
    pub place: String,
    pub temperature: f64,
    pub humidity: f64,
    /// Computed at insert time, never retroactively.
    pub warning: Option<String>,
    /// Server-assigned, stored in UTC.
    pub recorded_at: DateTime<Utc>,
}

/// Input for a reading insert.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub place_id: String,
    pub place: String,
    pub temperature: f64,
    pub humidity: f64,
    pub warning: Option<String>,
    /// Fixed timestamp for backfill and tests; `None` uses the store's
    /// clock. The ingestion pipeline always passes `None`.
    pub recorded_at: Option<DateTime<Utc>>,
}
