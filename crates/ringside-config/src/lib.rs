//! Ringside configuration
//!
//! Resolves the backend data store connection (environment first, then an
//! optional `.env` file, then compiled-in defaults) and publishes the data
//! store schema as static reference data.
//!
//! ```rust,ignore
//! use ringside_config::{ConfigResolver, ConnectionConfig};
//!
//! let resolver = ConfigResolver::builder().dotenv_if_exists(".env").build();
//! let conn = ConnectionConfig::resolve(&resolver).await;
//! ```

pub mod key;
pub mod providers;
pub mod resolver;
pub mod schema;

pub use key::ConfigKey;
pub use providers::{ConfigProvider, ProviderChain, ProviderCoverage, ProviderError, ProviderResult};
pub use resolver::{ConfigResolver, ConfigResolverBuilder, ConnectionConfig, ResolvedValue};
pub use schema::{SchemaDescriptor, SchemaEntry, SchemaObjectKind};
