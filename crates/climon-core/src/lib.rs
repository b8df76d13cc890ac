//! CLIMON Core — domain models, repository traits, and the pure
//! evaluation logic shared across all crates.
//!
//! This crate has no I/O: normalization, comfort-range evaluation, and
//! the error taxonomy live here; storage and orchestration live in
//! `climon-db` and `climon-service`.

pub mod comfort;
pub mod error;
pub mod models;
pub mod repository;
pub mod slug;

pub use comfort::ComfortConfig;
pub use error::{ClimonError, ClimonResult};
