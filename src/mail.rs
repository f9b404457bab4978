//! Outbound email delivery.
//!
//! Handlers talk to a `Mailer` trait object held in `AppState`, so the
//! transport is constructed once at startup from config and injected rather
//! than living in a module-level singleton. The default sender posts to the
//! Brevo transactional-email HTTP API; `MAIL_DRIVER=log` swaps in a sender
//! that logs instead of delivering, for local dev and tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error so the caller can surface it.
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Build the configured sender.
pub fn from_config(config: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.driver.as_str() {
        "log" => Ok(Arc::new(LogMailer)),
        _ => Ok(Arc::new(BrevoMailer::new(config)?)),
    }
}

/// Sender backed by the Brevo `smtp/email` endpoint.
pub struct BrevoMailer {
    http: Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl BrevoMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        })
    }

    fn payload(&self, to: &str, subject: &str, body: &str) -> Value {
        json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": [{ "email": to }],
            "subject": subject,
            "textContent": body,
        })
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&self.payload(to, subject, body))
            .send()
            .await
            .context("send email request")?;
        response
            .error_for_status()
            .context("mail provider rejected the request")?;
        Ok(())
    }
}

/// Local dev sender that logs the message instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, body = %body, "email send stub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;

    fn make_config() -> MailConfig {
        MailConfig {
            driver: "brevo".into(),
            api_url: "https://api.brevo.com/v3/smtp/email".into(),
            api_key: "test-key".into(),
            sender_email: "noreply@example.com".into(),
            sender_name: "Password Reset".into(),
            timeout_secs: 15,
        }
    }

    #[test]
    fn brevo_payload_shape() {
        let mailer = BrevoMailer::new(&make_config()).expect("build mailer");
        let payload = mailer.payload("user@example.com", "Password Reset OTP", "code 123456");

        assert_eq!(payload["sender"]["email"], "noreply@example.com");
        assert_eq!(payload["sender"]["name"], "Password Reset");
        assert_eq!(payload["to"][0]["email"], "user@example.com");
        assert_eq!(payload["subject"], "Password Reset OTP");
        assert_eq!(payload["textContent"], "code 123456");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer;
        mailer
            .send("user@example.com", "subject", "body")
            .await
            .expect("log mailer never fails");
    }

    #[test]
    fn from_config_honors_log_driver() {
        let config = MailConfig {
            driver: "log".into(),
            api_key: String::new(),
            ..make_config()
        };
        from_config(&config).expect("log mailer builds without api key");
    }
}
