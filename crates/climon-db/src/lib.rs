//! CLIMON Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbConfig`], [`DbManager`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `climon-core` traits
//! - Seed data for first boot ([`seed_defaults`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;
mod seed;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use seed::{SeedConfig, seed_defaults};
