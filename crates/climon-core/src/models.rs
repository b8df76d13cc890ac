//! Domain models for CLIMON.
//!
//! These are the core types shared across all crates.

pub mod reading;
pub mod tenant;
