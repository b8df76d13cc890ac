//! HTTP surface for the climate monitor: sensor ingestion, scoped
//! queries and exports, and owner-side client management.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{ServerConfig, create_app, run_server};
pub use state::AppState;
