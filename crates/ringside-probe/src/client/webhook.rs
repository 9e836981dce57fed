//! Client for the webhook server's HTTP endpoints

use std::time::Duration;

use crate::contracts::*;
use crate::error::{ProbeError, Result};

use super::DEFAULT_TIMEOUT;

/// Webhook server client
#[derive(Debug, Clone)]
pub struct WebhookClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookClient {
    /// Create new client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Liveness check
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(ProbeError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProbeError::malformed(format!("health response: {}: {}", e, body)))
    }

    /// Post a simulated provider SMS webhook
    ///
    /// Any non-200 answer or an acknowledgment with `success: false` is an
    /// API error.
    pub async fn send_sms(
        &self,
        message: &SmsMessage,
        dialect: SmsDialect,
    ) -> Result<SmsWebhookResponse> {
        let url = format!("{}/webhook/sms", self.base_url);
        let fields = dialect.form_fields(message);

        tracing::debug!(url = %url, dialect = ?dialect, "Posting SMS webhook");

        let response = self
            .client
            .post(&url)
            .form(&fields)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(ProbeError::api(status.as_u16(), body));
        }

        let ack: SmsWebhookResponse = serde_json::from_str(&body)
            .map_err(|e| ProbeError::malformed(format!("SMS acknowledgment: {}: {}", e, body)))?;

        if !ack.success {
            return Err(ProbeError::api(status.as_u16(), body));
        }

        Ok(ack)
    }
}
