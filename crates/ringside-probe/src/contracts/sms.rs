//! SMS webhook contracts

use serde::{Deserialize, Serialize};

/// Vendor-neutral SMS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub from: Option<String>,
    pub to: Option<String>,
    pub body: String,
}

impl SmsMessage {
    pub fn new(from: impl Into<String>, to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            body: body.into(),
        }
    }
}

/// Field naming used by a provider when posting the webhook form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsDialect {
    /// `From`, `To`, `Body`
    #[default]
    Twilio,
    /// `from`, `originalsenderid`, `message`
    Relay,
}

impl SmsDialect {
    /// Field names for (from, to, body)
    pub fn field_names(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            SmsDialect::Twilio => ("From", "To", "Body"),
            SmsDialect::Relay => ("from", "originalsenderid", "message"),
        }
    }

    /// Form fields for a message, omitting absent values
    pub fn form_fields(&self, message: &SmsMessage) -> Vec<(&'static str, String)> {
        let (from, to, body) = self.field_names();
        let mut fields = Vec::with_capacity(3);
        if let Some(value) = &message.from {
            fields.push((from, value.clone()));
        }
        if let Some(value) = &message.to {
            fields.push((to, value.clone()));
        }
        fields.push((body, message.body.clone()));
        fields
    }
}

/// JSON acknowledgment returned by the SMS webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsWebhookResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl SmsWebhookResponse {
    pub const RECEIVED: &'static str = "SMS received";

    /// Acknowledge a normalized message
    pub fn received(message: SmsMessage) -> Self {
        Self {
            success: true,
            message: Some(Self::RECEIVED.to_string()),
            error: None,
            from: message.from,
            to: message.to,
            body: Some(message.body),
        }
    }

    /// Report a failure to process the webhook
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            from: None,
            to: None,
            body: None,
        }
    }
}

/// Liveness response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: "Ringside webhook server is running".to_string(),
        }
    }
}
