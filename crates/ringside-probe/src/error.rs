//! Error types for probes
//!
//! Three kinds of failure end a probe run: the collaborator could not be
//! reached, it answered with something unusable, or the caller handed us a
//! malformed payload or event.

use thiserror::Error;

/// Main error type for probe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Network or connection failure, including timeouts
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx or malformed response from a collaborator
    #[error("API error{}: {body}", status_suffix(.status))]
    Api { status: Option<u16>, body: String },

    /// Malformed payload, event or argument supplied by the caller
    #[error("Validation error: {0}")]
    Validation(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl ProbeError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        ProbeError::Transport(msg.into())
    }

    /// Create an API error carrying the HTTP status and raw body
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        ProbeError::Api {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Create an API error for a response that could not be interpreted
    pub fn malformed(msg: impl Into<String>) -> Self {
        ProbeError::Api {
            status: None,
            body: msg.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        ProbeError::Validation(msg.into())
    }

    /// Short label used in reports and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Transport(_) => "transport",
            ProbeError::Api { .. } => "api",
            ProbeError::Validation(_) => "validation",
        }
    }

    /// Check if the caller caused this error (vs the collaborator)
    pub fn is_user_error(&self) -> bool {
        matches!(self, ProbeError::Validation(_))
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ProbeError::malformed(err.to_string())
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ProbeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ProbeError::Transport(format!("WebSocket: {}", err))
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
