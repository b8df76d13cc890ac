//! SurrealDB implementation of [`TenantRepository`].
//!
//! Credential material (password hash, API-key digest) arrives
//! pre-hashed from the service layer; this repository never sees
//! plaintext. Username and digest uniqueness are enforced by the
//! store's unique indexes — a violation surfaces as a conflict.

use chrono::{DateTime, Utc};
use climon_core::error::ClimonResult;
use climon_core::models::tenant::{CreateTenant, Role, Tenant, UpdateTenant};
use climon_core::repository::TenantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    username: String,
    password_hash: String,
    role: String,
    place: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    alerts_enabled: bool,
    interval_secs: u32,
    api_key_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    username: String,
    password_hash: String,
    role: String,
    place: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    alerts_enabled: bool,
    interval_secs: u32,
    api_key_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Owner" => Ok(Role::Owner),
        "Client" => Ok(Role::Client),
        other => Err(DbError::Migration(format!("unknown tenant role: {other}"))),
    }
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Owner => "Owner",
        Role::Client => "Client",
    }
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            place: self.place,
            display_name: self.display_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            alerts_enabled: self.alerts_enabled,
            interval_secs: self.interval_secs,
            api_key_hash: self.api_key_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Tenant {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            place: self.place,
            display_name: self.display_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            alerts_enabled: self.alerts_enabled,
            interval_secs: self.interval_secs,
            api_key_hash: self.api_key_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Tenant repository.
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealTenantRepository<C> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> ClimonResult<Tenant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 username = $username, \
                 password_hash = $password_hash, \
                 role = $role, \
                 place = $place, \
                 display_name = $display_name, \
                 email = $email, \
                 phone = $phone, \
                 address = $address, \
                 alerts_enabled = $alerts_enabled, \
                 interval_secs = $interval_secs, \
                 api_key_hash = $api_key_hash",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("password_hash", input.password_hash))
            .bind(("role", role_to_string(input.role).to_string()))
            .bind(("place", input.place))
            .bind(("display_name", input.display_name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("address", input.address))
            .bind(("alerts_enabled", input.alerts_enabled))
            .bind(("interval_secs", input.interval_secs))
            .bind(("api_key_hash", input.api_key_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_username(&self, username: &str) -> ClimonResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_api_key_hash(&self, api_key_hash: &str) -> ClimonResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE api_key_hash = $api_key_hash",
            )
            .bind(("api_key_hash", api_key_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: "api_key".into(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_client_by_place(&self, place: &str) -> ClimonResult<Option<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE role = 'Client' AND place = $place",
            )
            .bind(("place", place.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_tenant()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, username: &str, input: UpdateTenant) -> ClimonResult<Tenant> {
        let mut sets = Vec::new();
        if input.place.is_some() {
            sets.push("place = $place");
        }
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.alerts_enabled.is_some() {
            sets.push("alerts_enabled = $alerts_enabled");
        }
        if input.interval_secs.is_some() {
            sets.push("interval_secs = $interval_secs");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE tenant SET {} \
             WHERE username = $username \
             RETURN meta::id(id) AS record_id, *",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("username", username.to_string()));

        if let Some(place) = input.place {
            builder = builder.bind(("place", place));
        }
        if let Some(display_name) = input.display_name {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear.
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(alerts_enabled) = input.alerts_enabled {
            builder = builder.bind(("alerts_enabled", alerts_enabled));
        }
        if let Some(interval_secs) = input.interval_secs {
            builder = builder.bind(("interval_secs", interval_secs));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> ClimonResult<()> {
        self.db
            .query(
                "UPDATE tenant SET \
                 password_hash = $password_hash, updated_at = time::now() \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .bind(("password_hash", password_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_api_key_hash(&self, username: &str, api_key_hash: &str) -> ClimonResult<()> {
        let result = self
            .db
            .query(
                "UPDATE tenant SET \
                 api_key_hash = $api_key_hash, updated_at = time::now() \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .bind(("api_key_hash", api_key_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_statement)?;

        Ok(())
    }

    async fn toggle_alerts(&self, username: &str) -> ClimonResult<bool> {
        // One row write, so racing toggles each flip rather than
        // clobbering each other with a stale read.
        let mut result = self
            .db
            .query(
                "UPDATE tenant SET \
                 alerts_enabled = !alerts_enabled, updated_at = time::now() \
                 WHERE username = $username \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_tenant()?.alerts_enabled)
    }

    async fn delete(&self, username: &str) -> ClimonResult<()> {
        // Only client tenants can be deleted; readings keep their
        // denormalized place_id and are untouched.
        self.db
            .query("DELETE tenant WHERE username = $username AND role = 'Client'")
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_clients(&self) -> ClimonResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE role = 'Client' ORDER BY username ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        let tenants = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tenants)
    }
}
