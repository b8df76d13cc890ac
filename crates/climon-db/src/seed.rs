//! First-boot seed data.
//!
//! Creates the default owner account if no owner exists yet, so a fresh
//! deployment can log in and register clients. Idempotent.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;

/// Bootstrap configuration for the default owner account.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub owner_username: String,
    /// Plaintext owner password; hashed with Argon2id before storage.
    pub owner_password: String,
    pub owner_email: Option<String>,
    /// SHA-256 digest of the owner's API credential. The caller issues
    /// the raw key and is responsible for surfacing it exactly once.
    pub owner_api_key_hash: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
fn hash_password(password: &str) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Migration(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Migration(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Create the default owner account unless an owner already exists.
/// Returns whether an account was created.
pub async fn seed_defaults<C: Connection>(
    db: &Surreal<C>,
    config: &SeedConfig,
) -> Result<bool, DbError> {
    let mut result = db
        .query("SELECT count() AS total FROM tenant WHERE role = 'Owner' GROUP ALL")
        .await?;
    let rows: Vec<CountRow> = result.take(0)?;
    if rows.first().map(|r| r.total).unwrap_or(0) > 0 {
        return Ok(false);
    }

    let password_hash = hash_password(&config.owner_password)?;
    let id = Uuid::new_v4().to_string();

    db.query(
        "CREATE type::record('tenant', $id) SET \
         username = $username, \
         password_hash = $password_hash, \
         role = 'Owner', \
         place = NONE, \
         display_name = NONE, \
         email = $email, \
         phone = NONE, \
         address = NONE, \
         alerts_enabled = true, \
         interval_secs = 10, \
         api_key_hash = $api_key_hash",
    )
    .bind(("id", id))
    .bind(("username", config.owner_username.clone()))
    .bind(("password_hash", password_hash))
    .bind(("email", config.owner_email.clone()))
    .bind(("api_key_hash", config.owner_api_key_hash.clone()))
    .await?
    .check()
    .map_err(DbError::from_statement)?;

    info!(username = %config.owner_username, "Seeded default owner account");

    Ok(true)
}
