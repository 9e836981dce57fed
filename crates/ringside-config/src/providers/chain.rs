//! Provider Chain
//!
//! Combines providers into a priority-ordered chain. When fetching a value,
//! providers are tried in order until one returns a value.
//!
//! ```rust,ignore
//! let chain = ProviderChain::new()
//!     .with_provider(EnvProvider::default()) // Highest priority
//!     .with_provider(DefaultsProvider);    // Fallback
//!
//! let value = chain.get(ConfigKey::DatabaseUrl).await?;
//! ```

use super::traits::{ConfigProvider, ProviderCoverage, ProviderError, ProviderResult, ProviderValue};
use crate::key::ConfigKey;
use std::sync::Arc;

/// A chain of configuration providers with priority ordering
///
/// Providers are tried in the order they were added. The first provider
/// to return a value wins. Errors other than `NotFound` are logged and the
/// next provider is tried.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl ProviderChain {
    /// Create a new empty provider chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the chain (builder pattern)
    ///
    /// Providers added first have higher priority.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a provider to the chain
    pub fn add_provider<P: ConfigProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Arc::new(provider));
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Get a list of provider names in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Coverage of every provider, in priority order
    pub async fn coverage_all(&self) -> Vec<ProviderCoverage> {
        let mut all = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            all.push(provider.coverage().await);
        }
        all
    }
}

#[async_trait::async_trait]
impl ConfigProvider for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn get(&self, key: ConfigKey) -> ProviderResult<ProviderValue> {
        if self.providers.is_empty() {
            return Err(ProviderError::Unavailable(
                "No providers configured in chain".to_string(),
            ));
        }

        let mut last_error = None;

        for provider in &self.providers {
            match provider.get(key).await {
                Ok(value) => return Ok(value),
                Err(ProviderError::NotFound { .. }) => continue,
                Err(e) => {
                    tracing::debug!(
                        provider = provider.name(),
                        key = %key,
                        error = %e,
                        "Provider returned error, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::not_found(key)))
    }
}
