//! Core traits for configuration providers
//!
//! A provider answers lookups for [`ConfigKey`]s from one source. Providers
//! are composed into a [`ProviderChain`](super::ProviderChain) where the
//! first source holding a value wins.

use crate::key::ConfigKey;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when interacting with configuration providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The requested key was not found in this provider
    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// The provider is not available or not configured
    #[error("Provider not available: {0}")]
    Unavailable(String),

    /// Configuration or parsing error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// I/O error (for file-based providers)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProviderError {
    /// Create a not-found error for a key
    pub fn not_found(key: ConfigKey) -> Self {
        ProviderError::NotFound {
            key: key.env_var().to_string(),
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A configuration value with the name of the source that produced it
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderValue {
    /// The raw string value
    pub value: String,
    /// The provider that returned this value
    pub source: String,
    /// Whether the value must be redacted in output
    pub is_secret: bool,
}

impl ProviderValue {
    /// Create a new provider value
    pub fn new(value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
            is_secret: false,
        }
    }

    /// Create a secret value
    pub fn secret(value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
            is_secret: true,
        }
    }
}

impl fmt::Debug for ProviderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.is_secret { "***" } else { self.value.as_str() };
        f.debug_struct("ProviderValue")
            .field("value", &value)
            .field("source", &self.source)
            .field("is_secret", &self.is_secret)
            .finish()
    }
}

/// A source of connection settings
///
/// `get` returns `ProviderError::NotFound` for keys the source does not
/// hold, so a [`ProviderChain`](super::ProviderChain) can move on.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync + fmt::Debug {
    /// Short source name reported with every value (`env`, `dotenv`, `default`)
    fn name(&self) -> &str;

    async fn get(&self, key: ConfigKey) -> ProviderResult<ProviderValue>;

    /// Where this source reads from, when that is more than its name
    fn origin(&self) -> Option<String> {
        None
    }

    /// Which recognized keys this source can currently answer
    async fn coverage(&self) -> ProviderCoverage {
        let mut coverage = ProviderCoverage::new(self.name(), self.origin());
        for key in ConfigKey::ALL {
            match self.get(key).await {
                Ok(_) => coverage.provided.push(key),
                Err(ProviderError::NotFound { .. }) => {}
                Err(e) => coverage.errors.push(format!("{}: {}", key.env_var(), e)),
            }
        }
        coverage
    }
}

/// Keys one source holds, as shown by the `config` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCoverage {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub provided: Vec<ConfigKey>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProviderCoverage {
    pub fn new(provider: impl Into<String>, origin: Option<String>) -> Self {
        Self {
            provider: provider.into(),
            origin,
            provided: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether this source answers `key`
    pub fn provides(&self, key: ConfigKey) -> bool {
        self.provided.contains(&key)
    }
}
