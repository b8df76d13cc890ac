//! Application state for the API server.

use std::sync::Arc;

use axum::http::HeaderMap;
use climon_core::ClimonError;
use climon_core::models::tenant::{Role, Tenant};
use climon_core::repository::TenantRepository;
use climon_db::repository::{
    SurrealPlaceRepository, SurrealReadingRepository, SurrealTenantRepository,
};
use climon_service::credential::hash_api_key;
use climon_service::{
    AlertTransport, IngestService, QueryService, RegistrationService, ServiceConfig,
};
use surrealdb::{Connection, Surreal};

use crate::error::{ApiError, ApiResult};

/// Credential header carried by every authenticated request.
pub const API_KEY_HEADER: &str = "x-api-key";

type Ingest<C, T> = IngestService<
    SurrealTenantRepository<C>,
    SurrealReadingRepository<C>,
    SurrealPlaceRepository<C>,
    T,
>;
type Registration<C> = RegistrationService<SurrealTenantRepository<C>, SurrealPlaceRepository<C>>;
type Query<C> =
    QueryService<SurrealTenantRepository<C>, SurrealReadingRepository<C>, SurrealPlaceRepository<C>>;

/// Shared state handed to every handler.
pub struct AppState<C: Connection, T: AlertTransport> {
    pub ingest: Arc<Ingest<C, T>>,
    pub registration: Arc<Registration<C>>,
    pub query: Arc<Query<C>>,
    tenants: SurrealTenantRepository<C>,
}

impl<C: Connection, T: AlertTransport> Clone for AppState<C, T> {
    fn clone(&self) -> Self {
        Self {
            ingest: Arc::clone(&self.ingest),
            registration: Arc::clone(&self.registration),
            query: Arc::clone(&self.query),
            tenants: self.tenants.clone(),
        }
    }
}

impl<C: Connection, T: AlertTransport> AppState<C, T> {
    pub fn new(db: Surreal<C>, transport: T, config: ServiceConfig) -> Self {
        let tenants = SurrealTenantRepository::new(db.clone());
        let readings = SurrealReadingRepository::new(db.clone());
        let places = SurrealPlaceRepository::new(db);

        Self {
            ingest: Arc::new(IngestService::new(
                tenants.clone(),
                readings.clone(),
                places.clone(),
                transport,
                config.clone(),
            )),
            registration: Arc::new(RegistrationService::new(
                tenants.clone(),
                places.clone(),
                config.clone(),
            )),
            query: Arc::new(QueryService::new(
                tenants.clone(),
                readings,
                places,
                config,
            )),
            tenants,
        }
    }

    /// Resolve the caller from the credential header. An absent or
    /// unknown key is a 401 either way.
    pub async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<Tenant> {
        let raw_key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing X-Api-Key header".into()))?;

        match self.tenants.get_by_api_key_hash(&hash_api_key(raw_key)).await {
            Ok(tenant) => Ok(tenant),
            Err(ClimonError::NotFound { .. }) => {
                Err(ApiError::Unauthorized("unknown API key".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticate and require the owner role.
    pub async fn authenticate_owner(&self, headers: &HeaderMap) -> ApiResult<Tenant> {
        let tenant = self.authenticate(headers).await?;
        if tenant.role != Role::Owner {
            return Err(ClimonError::Forbidden {
                reason: "owner role required".into(),
            }
            .into());
        }
        Ok(tenant)
    }
}
