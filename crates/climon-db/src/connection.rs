//! Connection handling for the SurrealDB backing store.
//!
//! The server reaches SurrealDB over WebSocket with root credentials,
//! scoped to a single namespace/database pair. Deployments configure
//! the endpoint through `CLIMON_DB_*` environment variables; anything
//! unset falls back to a local-development default.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Where and how to reach the backing store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, host and port only (e.g. `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Read the `CLIMON_DB_*` environment variables, keeping the
    /// local-development default for any that are unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_or("CLIMON_DB_URL", defaults.url),
            namespace: env_or("CLIMON_DB_NS", defaults.namespace),
            database: env_or("CLIMON_DB_NAME", defaults.database),
            username: env_or("CLIMON_DB_USER", defaults.username),
            password: env_or("CLIMON_DB_PASS", defaults.password),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "climon".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

/// Owns the live SurrealDB session the repositories run against.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open a session per the configuration.
    ///
    /// Signs in as root and selects the configured namespace and
    /// database, so the returned handle is ready for queries.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Connected to SurrealDB");

        Ok(Self { db })
    }

    /// The underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_development() {
        let config = DbConfig::default();
        assert_eq!(config.url, "127.0.0.1:8000");
        assert_eq!(config.namespace, "climon");
        assert_eq!(config.database, "main");
    }
}
