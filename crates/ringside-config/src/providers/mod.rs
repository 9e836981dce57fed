//! Configuration providers
//!
//! - **Environment variables**: the process environment and `.env` files
//! - **Defaults**: compiled-in values for every recognized key
//!
//! All providers implement [`ConfigProvider`] and compose through
//! [`ProviderChain`].

pub mod chain;
pub mod defaults;
pub mod env;
pub mod traits;

pub use chain::ProviderChain;
pub use defaults::DefaultsProvider;
pub use env::{parse_dotenv, DotEnvProvider, EnvNaming, EnvProvider};
pub use traits::{ConfigProvider, ProviderCoverage, ProviderError, ProviderResult, ProviderValue};
