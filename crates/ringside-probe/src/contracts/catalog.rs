//! Commerce catalog payloads
//!
//! Objects are created with a client-side temporary id (`#`-prefixed) and
//! the catalog answers with a server-assigned id. Only server-assigned ids
//! may be used as cross-references, which is why [`CatalogObjectId`] cannot
//! be built from a temporary id and item drafts take a [`CreatedCategory`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProbeError, Result};

/// Client-generated temporary identifier, always `#`-prefixed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// Temporary id from a label (`#` is added when missing)
    pub fn new(label: impl AsRef<str>) -> Self {
        let label = label.as_ref();
        if label.starts_with('#') {
            Self(label.to_string())
        } else {
            Self(format!("#{}", label))
        }
    }

    /// Unique temporary id with a readable prefix, e.g. `#category-1f2e3d4c`
    pub fn generate(prefix: &str) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("#{}-{}", prefix, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned catalog object id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CatalogObjectId(String);

impl CatalogObjectId {
    /// Accept an id only if it could have come from the server
    ///
    /// Empty ids and unresolved temporary ids (`#...`) are rejected.
    pub fn server_assigned(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProbeError::validation("catalog object id is empty"));
        }
        if trimmed.starts_with('#') {
            return Err(ProbeError::validation(format!(
                "'{}' is an unresolved client-side id; use the id returned by the catalog",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryData {
    pub name: String,
}

/// Item fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemData {
    pub name: String,
    pub description: String,
    pub category_id: CatalogObjectId,
}

/// Catalog object sent for creation, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogPayload {
    Category { id: TempId, category_data: CategoryData },
    Item { id: TempId, item_data: ItemData },
}

impl CatalogPayload {
    /// Category payload with a fresh temporary id
    pub fn category(name: impl Into<String>) -> Self {
        CatalogPayload::Category {
            id: TempId::generate("category"),
            category_data: CategoryData { name: name.into() },
        }
    }

    /// Temporary id carried by the payload
    pub fn temp_id(&self) -> &TempId {
        match self {
            CatalogPayload::Category { id, .. } | CatalogPayload::Item { id, .. } => id,
        }
    }

    /// Display name of the object
    pub fn name(&self) -> &str {
        match self {
            CatalogPayload::Category { category_data, .. } => &category_data.name,
            CatalogPayload::Item { item_data, .. } => &item_data.name,
        }
    }

    /// `CATEGORY` or `ITEM`
    pub fn object_type(&self) -> &'static str {
        match self {
            CatalogPayload::Category { .. } => "CATEGORY",
            CatalogPayload::Item { .. } => "ITEM",
        }
    }
}

/// An item ready to be created, bound to a server-assigned category id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub category_id: CatalogObjectId,
}

impl ItemDraft {
    /// Draft an item in a category created earlier in this run
    pub fn in_category(
        name: impl Into<String>,
        description: impl Into<String>,
        category: &CreatedCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category_id: category.id.clone(),
        }
    }

    /// Draft an item from a raw category id
    ///
    /// Fails with a validation error for temporary (`#`) or empty ids.
    pub fn with_category_id(
        name: impl Into<String>,
        description: impl Into<String>,
        category_id: &str,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            description: description.into(),
            category_id: CatalogObjectId::server_assigned(category_id)?,
        })
    }

    /// Payload with a fresh temporary id
    pub fn into_payload(self) -> CatalogPayload {
        CatalogPayload::Item {
            id: TempId::generate("item"),
            item_data: ItemData {
                name: self.name,
                description: self.description,
                category_id: self.category_id,
            },
        }
    }
}

/// Request body for object creation
#[derive(Debug, Clone, Serialize)]
pub struct UpsertCatalogObjectRequest {
    pub idempotency_key: String,
    pub object: CatalogPayload,
}

impl UpsertCatalogObjectRequest {
    /// Wrap a payload with a fresh idempotency key
    pub fn new(object: CatalogPayload) -> Self {
        Self {
            idempotency_key: uuid::Uuid::new_v4().to_string(),
            object,
        }
    }
}

/// Object echoed back by the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogObject {
    pub id: String,
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

/// Mapping from a temporary id to the id the server assigned
#[derive(Debug, Clone, Deserialize)]
pub struct IdMapping {
    pub client_object_id: String,
    pub object_id: String,
}

/// Response body for object creation
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCatalogObjectResponse {
    pub catalog_object: Option<CatalogObject>,
    #[serde(default)]
    pub id_mappings: Vec<IdMapping>,
}

impl UpsertCatalogObjectResponse {
    /// Server id for the object created under `temp_id`
    ///
    /// The id mapping wins; the echoed object id is the fallback.
    pub fn resolve_id(&self, temp_id: &TempId) -> Result<CatalogObjectId> {
        let mapped = self
            .id_mappings
            .iter()
            .find(|m| m.client_object_id == temp_id.as_str())
            .map(|m| m.object_id.as_str());

        let raw = mapped
            .or_else(|| self.catalog_object.as_ref().map(|o| o.id.as_str()))
            .ok_or_else(|| ProbeError::malformed("response carries no catalog object id"))?;

        CatalogObjectId::server_assigned(raw)
            .map_err(|e| ProbeError::malformed(format!("unusable object id in response: {}", e)))
    }
}

/// A category the catalog accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedCategory {
    pub id: CatalogObjectId,
    pub temp_id: TempId,
    pub name: String,
}

/// An item the catalog accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedItem {
    pub id: CatalogObjectId,
    pub temp_id: TempId,
    pub name: String,
    pub category_id: CatalogObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_id_prefix() {
        assert_eq!(TempId::new("plumbing").as_str(), "#plumbing");
        assert_eq!(TempId::new("#plumbing").as_str(), "#plumbing");
        assert!(TempId::generate("item").as_str().starts_with("#item-"));
    }

    #[test]
    fn test_server_assigned_rejects_temp_ids() {
        assert!(CatalogObjectId::server_assigned("#category-1").is_err());
        assert!(CatalogObjectId::server_assigned("  ").is_err());
        assert_eq!(
            CatalogObjectId::server_assigned("W62UWFY35CWMYGVWK6TWJDNI")
                .unwrap()
                .as_str(),
            "W62UWFY35CWMYGVWK6TWJDNI"
        );
    }

    #[test]
    fn test_category_payload_shape() {
        let payload = CatalogPayload::Category {
            id: TempId::new("plumbing"),
            category_data: CategoryData {
                name: "Plumbing".to_string(),
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "CATEGORY",
                "id": "#plumbing",
                "category_data": { "name": "Plumbing" }
            })
        );
    }

    #[test]
    fn test_item_payload_shape() {
        let draft =
            ItemDraft::with_category_id("Drain cleaning", "Kitchen and bath drains", "CAT123")
                .unwrap();
        let payload = draft.into_payload();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "ITEM");
        assert!(json["id"].as_str().unwrap().starts_with("#item-"));
        assert_eq!(json["item_data"]["name"], "Drain cleaning");
        assert_eq!(json["item_data"]["description"], "Kitchen and bath drains");
        assert_eq!(json["item_data"]["category_id"], "CAT123");
    }

    #[test]
    fn test_item_draft_rejects_unresolved_category() {
        let err = ItemDraft::with_category_id("Drain cleaning", "", "#category-1").unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_resolve_id_prefers_mapping() {
        let temp = TempId::new("category-1");
        let response: UpsertCatalogObjectResponse = serde_json::from_value(serde_json::json!({
            "catalog_object": { "id": "ECHOED", "type": "CATEGORY", "version": 1 },
            "id_mappings": [ { "client_object_id": "#category-1", "object_id": "MAPPED" } ]
        }))
        .unwrap();
        assert_eq!(response.resolve_id(&temp).unwrap().as_str(), "MAPPED");
    }

    #[test]
    fn test_resolve_id_rejects_missing_or_temp_id() {
        let temp = TempId::new("category-1");
        let empty: UpsertCatalogObjectResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            empty.resolve_id(&temp),
            Err(ProbeError::Api { status: None, .. })
        ));

        let echoed_temp: UpsertCatalogObjectResponse = serde_json::from_value(
            serde_json::json!({ "catalog_object": { "id": "#category-1" } }),
        )
        .unwrap();
        assert!(echoed_temp.resolve_id(&temp).is_err());
    }

    #[test]
    fn test_request_has_idempotency_key() {
        let a = UpsertCatalogObjectRequest::new(CatalogPayload::category("Plumbing"));
        let b = UpsertCatalogObjectRequest::new(CatalogPayload::category("Plumbing"));
        assert_ne!(a.idempotency_key, b.idempotency_key);
        assert_eq!(a.object.object_type(), "CATEGORY");
    }
}
