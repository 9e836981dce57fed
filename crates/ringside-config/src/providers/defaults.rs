//! Compiled-in defaults, the last link of every resolver chain

use super::traits::{ConfigProvider, ProviderResult, ProviderValue};
use crate::key::ConfigKey;

/// Provider that answers every key with its compiled-in default
#[derive(Debug, Default)]
pub struct DefaultsProvider;

#[async_trait::async_trait]
impl ConfigProvider for DefaultsProvider {
    fn name(&self) -> &str {
        "default"
    }

    async fn get(&self, key: ConfigKey) -> ProviderResult<ProviderValue> {
        let value = key.default_value();
        Ok(if key.is_secret() {
            ProviderValue::secret(value, "default")
        } else {
            ProviderValue::new(value, "default")
        })
    }
}
