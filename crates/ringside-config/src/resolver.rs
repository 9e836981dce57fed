//! Connection settings resolution
//!
//! The resolver checks the process environment first, then an optional
//! `.env` file, then compiled-in defaults. It never fails and never writes
//! to the environment on its own; [`ConnectionConfig`] is the immutable
//! snapshot handed to collaborators.

use crate::key::ConfigKey;
use crate::providers::{
    ConfigProvider, DefaultsProvider, DotEnvProvider, EnvNaming, EnvProvider, ProviderChain,
    ProviderCoverage, ProviderResult,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A resolved value and the provider it came from
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    pub key: ConfigKey,
    pub value: String,
    pub source: String,
}

impl ResolvedValue {
    /// Value suitable for display (secrets masked)
    pub fn display_value(&self) -> String {
        if self.key.is_secret() {
            mask(&self.value)
        } else {
            self.value.clone()
        }
    }
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedValue")
            .field("key", &self.key)
            .field("value", &self.display_value())
            .field("source", &self.source)
            .finish()
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 8 {
        "***".to_string()
    } else {
        format!("{}***", visible)
    }
}

/// Resolves [`ConfigKey`]s through environment → `.env` → defaults
#[derive(Debug)]
pub struct ConfigResolver {
    chain: ProviderChain,
    naming: EnvNaming,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver over the process environment and compiled-in defaults
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a resolver
    pub fn builder() -> ConfigResolverBuilder {
        ConfigResolverBuilder::default()
    }

    /// Naming rules used for environment variables
    pub fn naming(&self) -> &EnvNaming {
        &self.naming
    }

    /// Providers consulted, in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.chain.provider_names()
    }

    /// Which keys each provider currently holds, in priority order
    pub async fn provider_coverage(&self) -> Vec<ProviderCoverage> {
        self.chain.coverage_all().await
    }

    /// Resolve a key
    ///
    /// Always succeeds: the chain ends in [`DefaultsProvider`]. Calling
    /// twice yields the same value as long as the environment is unchanged.
    pub async fn resolve(&self, key: ConfigKey) -> ResolvedValue {
        match self.chain.get(key).await {
            Ok(pv) => ResolvedValue {
                key,
                value: pv.value,
                source: pv.source,
            },
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Falling back to compiled-in default");
                ResolvedValue {
                    key,
                    value: key.default_value().to_string(),
                    source: "default".to_string(),
                }
            }
        }
    }

    /// Resolve every recognized key
    pub async fn resolve_all(&self) -> Vec<ResolvedValue> {
        let mut values = Vec::with_capacity(ConfigKey::ALL.len());
        for key in ConfigKey::ALL {
            values.push(self.resolve(key).await);
        }
        values
    }

    /// Write resolved values into the process environment where absent
    ///
    /// Externally supplied values are never overwritten, so repeated calls
    /// are no-ops. A variable set to the empty string counts as absent, the
    /// same as during resolution, and is filled. Returns the variable names
    /// that were written.
    pub fn export_missing(&self, config: &ConnectionConfig) -> Vec<String> {
        let mut written = Vec::new();
        for (key, value) in [
            (ConfigKey::DatabaseUrl, config.endpoint.as_str()),
            (ConfigKey::DatabaseKey, config.credential.as_str()),
        ] {
            let var = self.naming.var_name(key);
            let present = std::env::var(&var).map(|v| !v.is_empty()).unwrap_or(false);
            if !present {
                std::env::set_var(&var, value);
                tracing::debug!(var = %var, "Exported connection setting");
                written.push(var);
            }
        }
        written
    }
}

/// Builder for [`ConfigResolver`]
#[derive(Debug, Default)]
pub struct ConfigResolverBuilder {
    naming: EnvNaming,
    dotenv: Option<DotEnvProvider>,
}

impl ConfigResolverBuilder {
    /// Prefix every environment variable lookup
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming = EnvNaming::with_prefix(prefix);
        self
    }

    /// Consult a `.env` file after the process environment
    pub fn dotenv(mut self, path: impl AsRef<Path>) -> ProviderResult<Self> {
        self.dotenv = Some(DotEnvProvider::with_naming(path, self.naming.clone())?);
        Ok(self)
    }

    /// Consult a `.env` file if one exists at `path`
    pub fn dotenv_if_exists(self, path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return self;
        }
        let naming = self.naming.clone();
        match DotEnvProvider::with_naming(path.as_ref(), naming) {
            Ok(provider) => Self {
                dotenv: Some(provider),
                ..self
            },
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
                self
            }
        }
    }

    /// Build the resolver
    pub fn build(self) -> ConfigResolver {
        let mut chain =
            ProviderChain::new().with_provider(EnvProvider::with_naming(self.naming.clone()));
        if let Some(dotenv) = self.dotenv {
            chain.add_provider(dotenv);
        }
        chain.add_provider(DefaultsProvider);

        ConfigResolver {
            chain,
            naming: self.naming,
        }
    }
}

/// Backend data store connection parameters
///
/// Resolved once at process start and passed by reference afterwards.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub credential: String,
}

impl ConnectionConfig {
    /// Resolve both connection parameters
    pub async fn resolve(resolver: &ConfigResolver) -> Self {
        let endpoint = resolver.resolve(ConfigKey::DatabaseUrl).await;
        let credential = resolver.resolve(ConfigKey::DatabaseKey).await;

        tracing::info!(
            endpoint = %endpoint.value,
            endpoint_source = %endpoint.source,
            credential_source = %credential.source,
            "Resolved data store connection"
        );

        Self {
            endpoint: endpoint.value,
            credential: credential.value,
        }
    }

    /// Resolve with the default resolver
    pub async fn from_env() -> Self {
        Self::resolve(&ConfigResolver::new()).await
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &mask(&self.credential))
            .finish()
    }
}
