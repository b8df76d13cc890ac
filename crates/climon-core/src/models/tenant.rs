//! Tenant domain model.
//!
//! A tenant is a registered sensor-owning entity. Client tenants are
//! scoped to a single named place; the owner role has no place and sees
//! across all tenants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Owner,
    Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Globally unique login/sensor identity. Immutable after creation.
    pub username: String,
    /// Argon2id PHC-format hash. Plaintext is never stored or returned.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Raw place name as entered (e.g. `Office 1!!`). None for owners.
    pub place: Option<String>,
    /// Human-readable formatted name. Used over `username` when deriving
    /// the compound place identifier, if set.
    pub display_name: Option<String>,
    /// Alert recipient address. No address means no alerts.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Per-tenant alerting opt-in.
    pub alerts_enabled: bool,
    /// Advisory sampling interval hint for the remote sensor, in seconds.
    pub interval_secs: u32,
    /// SHA-256 hex digest of the opaque API credential. The raw key is
    /// handed out exactly once at issuance.
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// The name the compound place identifier is derived from: the
    /// formatted display name if present, else the raw username.
    pub fn handle(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// The compound `tenant_place` identifier scoping this tenant's
    /// readings. None for owners (who have no place of their own).
    pub fn place_id(&self) -> Option<String> {
        self.place
            .as_deref()
            .map(|place| slug::compound(self.handle(), place))
    }
}

/// Fields required to create a new tenant.
///
/// Credential material arrives pre-processed: the registration service
/// hashes the password and the API key before the row is written, so the
/// store never sees either in plaintext.
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub place: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub alerts_enabled: bool,
    pub interval_secs: u32,
    pub api_key_hash: String,
}

/// Fields that can be updated on an existing tenant.
///
/// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change
/// for the doubly-optional fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateTenant {
    pub place: Option<String>,
    pub display_name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub alerts_enabled: Option<bool>,
    pub interval_secs: Option<u32>,
}
