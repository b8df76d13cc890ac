//! Client management endpoints. Mutations are owner-only except the
//! alert toggle, which acts on the caller's own account.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use climon_core::models::tenant::UpdateTenant;
use climon_service::{AlertTransport, NewClient};
use surrealdb::Connection;

use crate::dto::{
    ClientResponse, CreateClientRequest, CredentialResponse, ToggleAlertsResponse,
    UpdateClientRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Register a new client and hand back its API key, once.
pub async fn create_client<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<Json<CredentialResponse>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    state.authenticate_owner(&headers).await?;

    let (tenant, api_key) = state
        .registration
        .create_client(NewClient {
            username: request.username,
            password: request.password,
            place: request.place,
            display_name: request.display_name,
            email: request.email,
            phone: request.phone,
            address: request.address,
            alerts_enabled: request.alerts_enabled,
            interval_secs: request.interval_secs,
        })
        .await?;

    Ok(Json(CredentialResponse {
        username: tenant.username,
        api_key,
    }))
}

pub async fn update_client<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> ApiResult<Json<ClientResponse>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    state.authenticate_owner(&headers).await?;

    let tenant = state
        .registration
        .update_client(
            &username,
            UpdateTenant {
                place: request.place,
                display_name: request.display_name,
                email: request.email,
                phone: request.phone,
                address: request.address,
                alerts_enabled: request.alerts_enabled,
                interval_secs: request.interval_secs,
            },
            request.password.as_deref(),
        )
        .await?;

    Ok(Json(tenant.into()))
}

pub async fn delete_client<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<serde_json::Value>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    state.authenticate_owner(&headers).await?;
    state.registration.delete_client(&username).await?;
    Ok(Json(serde_json::json!({ "deleted": username })))
}

pub async fn rotate_api_key<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<CredentialResponse>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    state.authenticate_owner(&headers).await?;
    let api_key = state.registration.rotate_api_key(&username).await?;
    Ok(Json(CredentialResponse { username, api_key }))
}

/// Flip the caller's own alert opt-in.
pub async fn toggle_alerts<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
) -> ApiResult<Json<ToggleAlertsResponse>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let tenant = state.authenticate(&headers).await?;
    let alerts_enabled = state.registration.toggle_alerts(&tenant.username).await?;
    Ok(Json(ToggleAlertsResponse {
        username: tenant.username,
        alerts_enabled,
    }))
}

/// Full client roster. Owner-only.
pub async fn export_clients<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ClientResponse>>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let tenant = state.authenticate(&headers).await?;
    let clients = state.query.export_clients(&tenant).await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}
