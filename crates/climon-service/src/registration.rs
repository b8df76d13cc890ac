//! Client account lifecycle: registration, profile updates, credential
//! rotation, and removal.

use climon_core::models::tenant::{CreateTenant, Role, Tenant, UpdateTenant};
use climon_core::repository::{PlaceRepository, TenantRepository};
use climon_core::slug;
use climon_core::ClimonResult;
use tracing::info;

use crate::config::ServiceConfig;
use crate::credential::{hash_api_key, issue_api_key};
use crate::error::ServiceError;
use crate::password::hash_password;

/// Input for registering a new sensor client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub username: String,
    pub password: String,
    pub place: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub alerts_enabled: bool,
    pub interval_secs: Option<u32>,
}

pub struct RegistrationService<TR, PR> {
    tenants: TR,
    places: PR,
    config: ServiceConfig,
}

impl<TR, PR> RegistrationService<TR, PR>
where
    TR: TenantRepository,
    PR: PlaceRepository,
{
    pub fn new(tenants: TR, places: PR, config: ServiceConfig) -> Self {
        Self {
            tenants,
            places,
            config,
        }
    }

    /// Register a new client tenant.
    ///
    /// Returns the stored tenant alongside the raw API key; the key is
    /// shown exactly once and only its digest is persisted.
    pub async fn create_client(&self, input: NewClient) -> ClimonResult<(Tenant, String)> {
        // 1. Validate required fields.
        let username = input.username.trim();
        if username.is_empty() {
            return Err(ServiceError::Malformed("username is required".into()).into());
        }
        if slug::normalize(username).is_empty() {
            return Err(ServiceError::Malformed(
                "username must contain at least one alphanumeric character".into(),
            )
            .into());
        }
        if input.place.trim().is_empty() {
            return Err(ServiceError::Malformed("place is required".into()).into());
        }
        // 2. Hash the password and issue the API credential.
        let password_hash = self.check_and_hash(&input.password)?;
        let raw_key = issue_api_key();
        let api_key_hash = hash_api_key(&raw_key);

        // 3. Persist the tenant; duplicate usernames surface as a
        //    registration failure from the unique index.
        let tenant = self
            .tenants
            .create(CreateTenant {
                username: username.to_string(),
                password_hash,
                role: Role::Client,
                place: Some(input.place.trim().to_string()),
                display_name: input.display_name,
                email: input.email,
                phone: input.phone,
                address: input.address,
                alerts_enabled: input.alerts_enabled,
                interval_secs: input
                    .interval_secs
                    .unwrap_or(self.config.default_interval_secs),
                api_key_hash,
            })
            .await?;

        // 4. Pre-register the compound place so owner queries can see
        //    it before the first reading arrives.
        if let Some(place_id) = tenant.place_id() {
            self.places.record(&place_id).await?;
        }

        info!(username = %tenant.username, "Client registered");
        Ok((tenant, raw_key))
    }

    /// Apply a partial profile update to an existing client, optionally
    /// replacing the password in the same call.
    ///
    /// The password is validated and hashed before anything is written,
    /// so a rejected password leaves the profile untouched and a failed
    /// profile update leaves the old password in force. When the place
    /// or display name changes, the new compound place identifier is
    /// recorded; readings stored under the old identifier stay
    /// untouched.
    pub async fn update_client(
        &self,
        username: &str,
        update: UpdateTenant,
        new_password: Option<&str>,
    ) -> ClimonResult<Tenant> {
        let password_hash = new_password.map(|p| self.check_and_hash(p)).transpose()?;

        let tenant = self.tenants.update(username, update).await?;
        if let Some(hash) = password_hash {
            self.tenants.update_password(username, &hash).await?;
        }
        if let Some(place_id) = tenant.place_id() {
            self.places.record(&place_id).await?;
        }
        info!(username = %tenant.username, "Client updated");
        Ok(tenant)
    }

    /// Replace a client's password.
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> ClimonResult<()> {
        let password_hash = self.check_and_hash(new_password)?;
        self.tenants.update_password(username, &password_hash).await?;
        info!(username, "Password updated");
        Ok(())
    }

    /// Issue a fresh API key for a client, invalidating the old one.
    pub async fn rotate_api_key(&self, username: &str) -> ClimonResult<String> {
        let raw_key = issue_api_key();
        self.tenants
            .set_api_key_hash(username, &hash_api_key(&raw_key))
            .await?;
        info!(username, "API key rotated");
        Ok(raw_key)
    }

    /// Flip the email alert opt-in flag, returning the new state. The
    /// flip is a single store write.
    pub async fn toggle_alerts(&self, username: &str) -> ClimonResult<bool> {
        let enabled = self.tenants.toggle_alerts(username).await?;
        info!(username, enabled, "Alerts toggled");
        Ok(enabled)
    }

    /// Remove a client account. Stored readings are retained under the
    /// orphaned place identifier for historical queries.
    pub async fn delete_client(&self, username: &str) -> ClimonResult<()> {
        self.tenants.delete(username).await?;
        info!(username, "Client deleted");
        Ok(())
    }

    pub async fn list_clients(&self) -> ClimonResult<Vec<Tenant>> {
        Ok(self.tenants.list_clients().await?)
    }

    fn check_and_hash(&self, password: &str) -> ClimonResult<String> {
        if password.len() < self.config.min_password_length {
            return Err(ServiceError::RegistrationRejected(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            ))
            .into());
        }
        Ok(hash_password(password)?)
    }
}
