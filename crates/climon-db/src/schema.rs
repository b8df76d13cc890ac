//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Uniqueness invariants (tenant
//! username, credential digest, known place) are unique indexes.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (registered sensor-owning identities)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD username ON TABLE tenant TYPE string;
DEFINE FIELD password_hash ON TABLE tenant TYPE string;
DEFINE FIELD role ON TABLE tenant TYPE string \
    ASSERT $value IN ['Owner', 'Client'];
DEFINE FIELD place ON TABLE tenant TYPE option<string>;
DEFINE FIELD display_name ON TABLE tenant TYPE option<string>;
DEFINE FIELD email ON TABLE tenant TYPE option<string>;
DEFINE FIELD phone ON TABLE tenant TYPE option<string>;
DEFINE FIELD address ON TABLE tenant TYPE option<string>;
DEFINE FIELD alerts_enabled ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD interval_secs ON TABLE tenant TYPE int DEFAULT 10;
DEFINE FIELD api_key_hash ON TABLE tenant TYPE string;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_username ON TABLE tenant \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_tenant_api_key ON TABLE tenant \
    COLUMNS api_key_hash UNIQUE;

-- =======================================================================
-- Readings (append-only; rows are never updated)
-- =======================================================================
DEFINE TABLE reading SCHEMAFULL;
DEFINE FIELD seq ON TABLE reading TYPE int;
DEFINE FIELD place_id ON TABLE reading TYPE string;
DEFINE FIELD place ON TABLE reading TYPE string;
DEFINE FIELD temperature ON TABLE reading TYPE float;
DEFINE FIELD humidity ON TABLE reading TYPE float;
DEFINE FIELD warning ON TABLE reading TYPE option<string>;
DEFINE FIELD recorded_at ON TABLE reading TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_reading_place_time ON TABLE reading \
    COLUMNS place_id, recorded_at;
DEFINE INDEX idx_reading_seq ON TABLE reading COLUMNS seq UNIQUE;

-- =======================================================================
-- Known places (derived set of compound identifiers ever seen)
-- =======================================================================
DEFINE TABLE known_place SCHEMAFULL;
DEFINE FIELD place_id ON TABLE known_place TYPE string;
DEFINE FIELD first_seen_at ON TABLE known_place TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_known_place ON TABLE known_place \
    COLUMNS place_id UNIQUE;

-- =======================================================================
-- Counters (atomic single-row sequences)
-- =======================================================================
DEFINE TABLE counter SCHEMAFULL;
DEFINE FIELD n ON TABLE counter TYPE int DEFAULT 0;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
