//! Service configuration.

use chrono_tz::Tz;
use climon_core::ComfortConfig;
use std::time::Duration;

/// Configuration for the CLIMON services.
///
/// Built once at startup and passed explicitly; nothing here is read
/// from ambient global state.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Comfort bands readings are evaluated against.
    pub comfort: ComfortConfig,
    /// Time zone timestamps are rendered in at the query/alert boundary.
    /// Storage is always UTC (default: Europe/London).
    pub display_tz: Tz,
    /// Hard ceiling on one alert dispatch attempt (default: 5 s), so a
    /// slow mail transport can only delay, never stall, ingestion.
    pub alert_timeout: Duration,
    /// Minimum accepted password length at registration (default: 6).
    pub min_password_length: usize,
    /// Default advisory sampling interval handed to new clients, in
    /// seconds (default: 10).
    pub default_interval_secs: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            comfort: ComfortConfig::default(),
            display_tz: chrono_tz::Europe::London,
            alert_timeout: Duration::from_secs(5),
            min_password_length: 6,
            default_interval_secs: 10,
        }
    }
}
