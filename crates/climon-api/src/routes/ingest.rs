//! Sensor ingestion endpoint.

use axum::{Json, extract::State, http::HeaderMap};
use climon_service::AlertTransport;
use surrealdb::Connection;

use crate::dto::{SubmitDataRequest, SubmitDataResponse};
use crate::error::ApiResult;
use crate::state::{API_KEY_HEADER, AppState};

/// Accept one sensor reading.
///
/// With an `X-Api-Key` header the reading is attributed to the keyed
/// tenant. Without one the legacy place-name path is taken, kept for
/// sensors flashed before credentials existed.
pub async fn submit_data<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Json(request): Json<SubmitDataRequest>,
) -> ApiResult<Json<SubmitDataResponse>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let payload = request.into_payload()?;

    let outcome = match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) if !key.is_empty() => state.ingest.ingest(key, payload).await?,
        _ => state.ingest.ingest_legacy(payload).await?,
    };

    Ok(Json(outcome.into()))
}
