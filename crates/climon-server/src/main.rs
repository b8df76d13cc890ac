//! CLIMON server — application entry point.

use std::env;

use climon_api::{AppState, ServerConfig, run_server};
use climon_db::{DbConfig, DbManager, SeedConfig, run_migrations, seed_defaults};
use climon_service::credential::{hash_api_key, issue_api_key};
use climon_service::{ServiceConfig, SmtpAlertTransport, SmtpConfig};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: env_or("CLIMON_SMTP_HOST", "smtp.gmail.com"),
        port: env_or("CLIMON_SMTP_PORT", "587").parse().unwrap_or(587),
        username: env_or("CLIMON_SMTP_USER", ""),
        password: env_or("CLIMON_SMTP_PASS", ""),
        sender: env_or("CLIMON_SMTP_SENDER", "alerts@climon.local"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::from_default_env()
        .add_directive("climon_server=info".parse()?)
        .add_directive("climon_api=info".parse()?)
        .add_directive("climon_db=info".parse()?)
        .add_directive("climon_service=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting CLIMON server...");

    let manager = DbManager::connect(&DbConfig::from_env()).await?;
    let db = manager.client().clone();
    run_migrations(&db).await?;

    // First boot seeds the owner account; its API key is printed once
    // and never recoverable afterwards.
    let owner_key = issue_api_key();
    let created = seed_defaults(
        &db,
        &SeedConfig {
            owner_username: env_or("CLIMON_OWNER_USER", "owner"),
            owner_password: env_or("CLIMON_OWNER_PASS", "change-me"),
            owner_email: env::var("CLIMON_OWNER_EMAIL").ok(),
            owner_api_key_hash: hash_api_key(&owner_key),
        },
    )
    .await?;
    if created {
        tracing::info!(api_key = %owner_key, "Owner account created; store this key now");
    }

    let transport = SmtpAlertTransport::new(&smtp_config())?;
    let state = AppState::new(db, transport, ServiceConfig::default());

    let server_config = ServerConfig {
        host: env_or("CLIMON_HOST", "0.0.0.0"),
        port: env_or("CLIMON_PORT", "8080").parse().unwrap_or(8080),
    };
    run_server(server_config, state).await?;

    tracing::info!("CLIMON server stopped.");
    Ok(())
}
