//! Environment Variable Providers
//!
//! This module provides adapters for loading configuration from:
//! - Raw process environment variables
//! - `.env` files
//!
//! # Naming
//!
//! Keys map to their variable name (`SUPABASE_URL`, `SUPABASE_KEY`). An
//! optional prefix is joined with `_`, so prefix `STAGING` looks up
//! `STAGING_SUPABASE_URL`.

use super::traits::{ConfigProvider, ProviderError, ProviderResult, ProviderValue};
use crate::key::ConfigKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Naming rules for mapping keys to environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvNaming {
    /// Prefix for all variables (optional)
    pub prefix: Option<String>,
}

impl EnvNaming {
    /// Create naming rules with a prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Build the variable name for a key
    pub fn var_name(&self, key: ConfigKey) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}_{}", prefix.trim_end_matches('_'), key.env_var()).to_uppercase()
            }
            _ => key.env_var().to_string(),
        }
    }
}

fn value_for(key: ConfigKey, value: String, source: &str) -> ProviderValue {
    if key.is_secret() {
        ProviderValue::secret(value, source)
    } else {
        ProviderValue::new(value, source)
    }
}

/// Provider for process environment variables
///
/// Read-only; reflects the environment at query time. Empty values count
/// as absent.
#[derive(Debug, Default)]
pub struct EnvProvider {
    naming: EnvNaming,
}

impl EnvProvider {
    /// Create an environment provider with a prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            naming: EnvNaming::with_prefix(prefix),
        }
    }

    /// Create an environment provider with explicit naming rules
    pub fn with_naming(naming: EnvNaming) -> Self {
        Self { naming }
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get(&self, key: ConfigKey) -> ProviderResult<ProviderValue> {
        let var_name = self.naming.var_name(key);

        match std::env::var(&var_name) {
            Ok(value) if !value.is_empty() => Ok(value_for(key, value, "env")),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(ProviderError::not_found(key)),
            Err(std::env::VarError::NotUnicode(_)) => Err(ProviderError::ConfigurationError(
                format!("Environment variable {} contains invalid UTF-8", var_name),
            )),
        }
    }
}

/// Provider for `.env` file configuration
///
/// The file is parsed once at construction.
///
/// ```text
/// # Comment
/// SUPABASE_URL=https://abc.supabase.co
/// SUPABASE_KEY="quoted value"
/// export STAGING_SUPABASE_URL=https://staging.supabase.co
/// ```
#[derive(Debug)]
pub struct DotEnvProvider {
    path: PathBuf,
    naming: EnvNaming,
    values: HashMap<String, String>,
}

impl DotEnvProvider {
    /// Load a provider from a `.env` file path
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        Self::with_naming(path, EnvNaming::default())
    }

    /// Load a provider with explicit naming rules
    pub fn with_naming(path: impl AsRef<Path>, naming: EnvNaming) -> ProviderResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ProviderError::ConfigurationError(format!(
                ".env file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let values = parse_dotenv(&content);
        tracing::debug!(path = %path.display(), entries = values.len(), "Loaded .env file");

        Ok(Self {
            path,
            naming,
            values,
        })
    }
}

/// Parse `.env` content into a map
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.trim().to_string(), value);
        }
    }

    values
}

#[async_trait::async_trait]
impl ConfigProvider for DotEnvProvider {
    fn name(&self) -> &str {
        "dotenv"
    }

    async fn get(&self, key: ConfigKey) -> ProviderResult<ProviderValue> {
        match self.values.get(&self.naming.var_name(key)) {
            Some(value) if !value.is_empty() => Ok(value_for(key, value.clone(), "dotenv")),
            _ => Err(ProviderError::not_found(key)),
        }
    }

    fn origin(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }
}
