//! Alert composition and outbound mail dispatch.
//!
//! Alerting is best-effort: transport failures are caught and logged,
//! never propagated into the ingestion response status.

use chrono::Utc;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Outbound mail seam. The dispatcher only ever hands over
/// (recipient, subject, body); transport and auth details live behind
/// this trait.
pub trait AlertTransport: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay host (e.g., `smtp.gmail.com`).
    pub host: String,
    /// Submission port (default: 587, STARTTLS).
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address (`From` header).
    pub sender: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
        }
    }
}

/// STARTTLS SMTP implementation of [`AlertTransport`] via lettre.
#[derive(Clone)]
pub struct SmtpAlertTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpAlertTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ServiceError::Dispatch(format!("SMTP relay setup: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            mailer,
            sender: config.sender.clone(),
        })
    }
}

impl AlertTransport for SmtpAlertTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        let message = Message::builder()
            .from(
                self.sender
                    .parse()
                    .map_err(|e| ServiceError::Dispatch(format!("bad sender address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| ServiceError::Dispatch(format!("bad recipient address: {e}")))?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| ServiceError::Dispatch(format!("message build: {e}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| ServiceError::Dispatch(format!("SMTP send: {e}")))?;

        Ok(())
    }
}

/// Composes the fixed-format out-of-range notification.
pub struct AlertDispatcher<'a> {
    config: &'a ServiceConfig,
}

impl<'a> AlertDispatcher<'a> {
    pub fn new(config: &'a ServiceConfig) -> Self {
        Self { config }
    }

    /// Compose and send one alert. Errors are logged and returned for
    /// response metadata; callers must not fail the request on them.
    pub async fn dispatch<T: AlertTransport>(
        &self,
        transport: &T,
        to: &str,
        place_id: &str,
        temperature: f64,
        humidity: f64,
        warning: &str,
    ) -> Result<(), ServiceError> {
        let subject = format!("Alert: {place_id} readings out of range");
        let now = Utc::now().with_timezone(&self.config.display_tz);
        let body = format!(
            "Place: {place_id}\n\
             Temperature: {temperature}°C\n\
             Humidity: {humidity}%\n\
             Warning: {warning}\n\
             Time: {}",
            now.format("%Y-%m-%d %H:%M:%S %Z"),
        );

        match transport.send(to, &subject, &body).await {
            Ok(()) => {
                info!(place_id, to, "Alert email sent");
                Ok(())
            }
            Err(e) => {
                warn!(place_id, to, error = %e, "Alert email failed");
                Err(e)
            }
        }
    }
}
