//! API route handlers.

pub mod clients;
pub mod health;
pub mod ingest;
pub mod readings;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use climon_service::AlertTransport;
use surrealdb::Connection;

use crate::state::AppState;

/// Assemble the full route table over the shared state.
pub fn create_router<C, T>(state: AppState<C, T>) -> Router
where
    C: Connection,
    T: AlertTransport + 'static,
{
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Ingestion
        .route("/submit-data", post(ingest::submit_data))
        // Scoped reads
        .route("/latest-data", get(readings::latest_data))
        .route("/history", get(readings::history))
        .route("/export", get(readings::export))
        .route("/export/clients", get(clients::export_clients))
        // Client management (owner only)
        .route("/clients", post(clients::create_client))
        .route("/clients/{username}", put(clients::update_client))
        .route("/clients/{username}", delete(clients::delete_client))
        .route(
            "/clients/{username}/rotate-key",
            post(clients::rotate_api_key),
        )
        // Per-tenant alert opt-in
        .route("/toggle-alerts", post(clients::toggle_alerts))
        .with_state(state)
}
