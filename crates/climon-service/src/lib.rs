//! CLIMON Service — credential issuance and verification, client
//! registration, the ingestion pipeline, alert dispatch, and the
//! access-scoped query layer.
//!
//! Services are generic over the `climon-core` repository traits so
//! this crate has no dependency on the database crate.

pub mod alert;
pub mod config;
pub mod credential;
pub mod error;
pub mod password;
pub mod pipeline;
pub mod query;
pub mod registration;

pub use alert::{AlertTransport, SmtpAlertTransport, SmtpConfig};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use pipeline::{AlertStatus, IngestOutcome, IngestService, SensorPayload};
pub use query::{PlaceSelector, QueryService, ReadingView};
pub use registration::{NewClient, RegistrationService};
