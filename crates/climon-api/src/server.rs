//! API server setup.

use std::net::SocketAddr;

use axum::Router;
use climon_service::AlertTransport;
use surrealdb::Connection;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes::create_router;
use crate::state::AppState;

/// Bind configuration for the HTTP listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Build the full application router with request tracing attached.
pub fn create_app<C, T>(state: AppState<C, T>) -> Router
where
    C: Connection,
    T: AlertTransport + 'static,
{
    create_router(state).layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn run_server<C, T>(
    config: ServerConfig,
    state: AppState<C, T>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let app = create_app(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("API server listening on {addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
