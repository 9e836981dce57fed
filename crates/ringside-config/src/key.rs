//! Recognized configuration keys
//!
//! Every key carries its environment variable name and a compiled-in
//! default, so resolution can always produce a value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default endpoint of the backend data store (local Supabase stack)
pub const DEFAULT_DATABASE_URL: &str = "http://127.0.0.1:54321";

/// Default anon credential for the local data store
pub const DEFAULT_DATABASE_KEY: &str = "ringside-local-anon-key";

/// A configuration key known to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// Backend data store endpoint
    DatabaseUrl,
    /// Backend data store credential
    DatabaseKey,
}

impl ConfigKey {
    /// All recognized keys, in resolution order
    pub const ALL: [ConfigKey; 2] = [ConfigKey::DatabaseUrl, ConfigKey::DatabaseKey];

    /// Environment variable name (without any prefix)
    pub fn env_var(&self) -> &'static str {
        match self {
            ConfigKey::DatabaseUrl => "SUPABASE_URL",
            ConfigKey::DatabaseKey => "SUPABASE_KEY",
        }
    }

    /// Compiled-in default value
    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::DatabaseUrl => DEFAULT_DATABASE_URL,
            ConfigKey::DatabaseKey => DEFAULT_DATABASE_KEY,
        }
    }

    /// Whether values for this key must be redacted in output
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigKey::DatabaseKey)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}
