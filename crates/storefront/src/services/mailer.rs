//! Transactional email.
//!
//! [`HttpMailer`] posts JSON to a transactional mail API with a bearer key.
//! Without an API configured, [`LogMailer`] records sends in the log only.
//! Sends never block a request: [`send_in_background`] spawns them and logs
//! failures.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use crate::config::MailerConfig;

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API key is not a valid header value.
    #[error("invalid API key")]
    InvalidKey,
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Something that delivers email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns `MailerError` if delivery fails.
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mailer backed by an HTTP mail API.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    from: String,
}

impl HttpMailer {
    /// Create a mailer for `api_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MailerConfig, api_url: &str) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let auth_value = format!("Bearer {}", key.expose_secret());
            let mut value = HeaderValue::from_str(&auth_value).map_err(|_| MailerError::InvalidKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_owned(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&SendRequest {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(MailerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Mailer that only logs what it would send.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Mail API not configured, skipping send");
        Ok(())
    }
}

/// Mailer that keeps every message, for tests.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

/// Build the mailer described by the configuration.
///
/// # Errors
///
/// Returns error if the HTTP client fails to build.
pub fn from_config(config: &MailerConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    match config.api_url.as_deref() {
        Some(url) => Ok(Arc::new(HttpMailer::new(config, url)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Send without waiting; failures are logged and otherwise ignored.
pub fn send_in_background(mailer: Arc<dyn Mailer>, email: Email) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&email).await {
            tracing::warn!(error = %e, to = %email.to, subject = %email.subject, "Failed to send email");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email {
            to: "jane@example.com".to_owned(),
            subject: "Hello".to_owned(),
            text: "Body".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::default();
        mailer.send(&email()).await.unwrap();
        assert_eq!(mailer.sent(), vec![email()]);
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_logs_only() {
        let mailer = from_config(&MailerConfig::default()).unwrap();
        assert!(mailer.send(&email()).await.is_ok());
    }
}
