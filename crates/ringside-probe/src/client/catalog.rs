//! Commerce catalog client
//!
//! One-shot object creation. Every request carries a fresh idempotency key
//! and nothing is retried.

use std::time::Duration;

use crate::contracts::*;
use crate::error::{ProbeError, Result};

use super::DEFAULT_TIMEOUT;

/// Catalog API version sent with every request
pub const DEFAULT_API_VERSION: &str = "2024-01-18";

/// Header carrying the API version
pub const API_VERSION_HEADER: &str = "Square-Version";

/// Client for the catalog object endpoint
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    access_token: String,
    api_version: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl CatalogClient {
    /// Object creation path
    pub const OBJECT_PATH: &'static str = "/v2/catalog/object";

    /// Create new client
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API version header value
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Create a category and return its server-assigned id
    pub async fn create_category(&self, name: &str) -> Result<CreatedCategory> {
        if name.trim().is_empty() {
            return Err(ProbeError::validation("category name is empty"));
        }

        let payload = CatalogPayload::category(name);
        let temp_id = payload.temp_id().clone();
        let response = self.upsert(payload).await?;
        let id = response.resolve_id(&temp_id)?;

        tracing::info!(category_id = %id, temp_id = %temp_id, "Catalog category created");

        Ok(CreatedCategory {
            id,
            temp_id,
            name: name.to_string(),
        })
    }

    /// Create an item in a category created earlier
    pub async fn create_item(&self, draft: ItemDraft) -> Result<CreatedItem> {
        if draft.name.trim().is_empty() {
            return Err(ProbeError::validation("item name is empty"));
        }

        let name = draft.name.clone();
        let category_id = draft.category_id.clone();
        let payload = draft.into_payload();
        let temp_id = payload.temp_id().clone();
        let response = self.upsert(payload).await?;
        let id = response.resolve_id(&temp_id)?;

        tracing::info!(item_id = %id, category_id = %category_id, "Catalog item created");

        Ok(CreatedItem {
            id,
            temp_id,
            name,
            category_id,
        })
    }

    async fn upsert(&self, object: CatalogPayload) -> Result<UpsertCatalogObjectResponse> {
        let url = format!("{}{}", self.base_url, Self::OBJECT_PATH);
        let request = UpsertCatalogObjectRequest::new(object);

        tracing::debug!(
            url = %url,
            object_type = request.object.object_type(),
            temp_id = %request.object.temp_id(),
            idempotency_key = %request.idempotency_key,
            "Sending catalog upsert"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(API_VERSION_HEADER, &self.api_version)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProbeError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProbeError::malformed(format!("{} in response body: {}", e, body)))
    }
}
