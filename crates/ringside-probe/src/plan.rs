//! Probe plans
//!
//! A plan file lists probes to run in order. JSON and YAML are accepted:
//!
//! ```yaml
//! fail_fast: true
//! probes:
//!   - kind: health
//!     base_url: http://localhost:8080
//!   - kind: sms
//!     base_url: http://localhost:8080
//!     from: "+19404656984"
//!     body: pipe burst
//!     dialect: relay
//!   - kind: stream
//!     base_url: ws://localhost:8080
//!     call_sid: CA0001
//!     frames: 5
//!     chunk_bytes: 320
//!   - kind: catalog
//!     category_name: Plumbing
//!     item_name: Drain cleaning
//! ```
//!
//! Catalog credentials are never stored in the plan; `access_token_env`
//! names the environment variable holding them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::client::{CatalogClient, MediaStreamClient, WebhookClient};
use crate::contracts::{SmsDialect, SmsMessage, DEFAULT_CHUNK_BYTES, DEFAULT_FRAME_MS};
use crate::engine::{CatalogProbe, HealthProbe, ProbeEngine, SmsProbe, StreamProbe};
use crate::error::{ProbeError, Result};

/// Default catalog API base URL (sandbox)
pub const DEFAULT_CATALOG_URL: &str = "https://connect.squareupsandbox.com";

/// Default environment variable holding the catalog access token
pub const DEFAULT_TOKEN_ENV: &str = "CATALOG_ACCESS_TOKEN";

fn default_frames() -> u32 {
    3
}

fn default_chunk_bytes() -> usize {
    DEFAULT_CHUNK_BYTES
}

fn default_pacing_ms() -> u64 {
    DEFAULT_FRAME_MS
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// One probe in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeSpec {
    Health {
        #[serde(default)]
        id: Option<String>,
        base_url: String,
    },
    Sms {
        #[serde(default)]
        id: Option<String>,
        base_url: String,
        from: String,
        #[serde(default)]
        to: Option<String>,
        #[serde(default)]
        body: String,
        #[serde(default)]
        dialect: SmsDialect,
    },
    Stream {
        #[serde(default)]
        id: Option<String>,
        base_url: String,
        call_sid: String,
        #[serde(default = "default_frames")]
        frames: u32,
        #[serde(default = "default_chunk_bytes")]
        chunk_bytes: usize,
        #[serde(default = "default_pacing_ms")]
        pacing_ms: u64,
    },
    Catalog {
        #[serde(default)]
        id: Option<String>,
        #[serde(default = "default_catalog_url")]
        base_url: String,
        #[serde(default = "default_token_env")]
        access_token_env: String,
        category_name: String,
        item_name: String,
        #[serde(default)]
        item_description: String,
    },
}

/// An ordered list of probes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePlan {
    /// Stop after the first failed probe
    #[serde(default)]
    pub fail_fast: bool,

    /// Per-request timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    pub probes: Vec<ProbeSpec>,
}

impl ProbePlan {
    /// Load a plan; `.yaml`/`.yml` files are YAML, everything else JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::validation(format!("cannot read plan {}: {}", path.display(), e))
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let plan: Self = if is_yaml {
            serde_yaml::from_str(&content)
                .map_err(|e| ProbeError::validation(format!("invalid YAML plan: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| ProbeError::validation(format!("invalid JSON plan: {}", e)))?
        };

        if plan.probes.is_empty() {
            return Err(ProbeError::validation("plan lists no probes"));
        }

        Ok(plan)
    }

    /// Build an engine, reading catalog tokens from the process environment
    pub fn build_engine(&self) -> Result<ProbeEngine> {
        self.build_engine_with(|var| std::env::var(var).ok())
    }

    /// Build an engine with an explicit token lookup
    pub fn build_engine_with<F>(&self, lookup: F) -> Result<ProbeEngine>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = self.timeout_ms.map(Duration::from_millis);
        let mut engine = ProbeEngine::new().with_fail_fast(self.fail_fast);

        for (index, entry) in self.probes.iter().enumerate() {
            let default_id = |kind: &str| format!("{}-{}", kind, index + 1);

            match entry {
                ProbeSpec::Health { id, base_url } => {
                    let mut client = WebhookClient::new(base_url);
                    if let Some(t) = timeout {
                        client = client.with_timeout(t);
                    }
                    let id = id.clone().unwrap_or_else(|| default_id("health"));
                    engine.add_probe(Box::new(HealthProbe::new(client).with_id(id)));
                }
                ProbeSpec::Sms {
                    id,
                    base_url,
                    from,
                    to,
                    body,
                    dialect,
                } => {
                    let mut client = WebhookClient::new(base_url);
                    if let Some(t) = timeout {
                        client = client.with_timeout(t);
                    }
                    let message = SmsMessage {
                        from: Some(from.clone()),
                        to: to.clone(),
                        body: body.clone(),
                    };
                    let id = id.clone().unwrap_or_else(|| default_id("sms"));
                    engine.add_probe(Box::new(SmsProbe::new(client, message, *dialect).with_id(id)));
                }
                ProbeSpec::Stream {
                    id,
                    base_url,
                    call_sid,
                    frames,
                    chunk_bytes,
                    pacing_ms,
                } => {
                    let mut client = MediaStreamClient::new(base_url);
                    if let Some(t) = timeout {
                        client = client.with_timeout(t);
                    }
                    let id = id.clone().unwrap_or_else(|| default_id("stream"));
                    engine.add_probe(Box::new(
                        StreamProbe::new(client, call_sid)
                            .with_id(id)
                            .with_frames(*frames)
                            .with_chunk_bytes(*chunk_bytes)
                            .with_pacing(Duration::from_millis(*pacing_ms)),
                    ));
                }
                ProbeSpec::Catalog {
                    id,
                    base_url,
                    access_token_env,
                    category_name,
                    item_name,
                    item_description,
                } => {
                    let token = lookup(access_token_env)
                        .filter(|t| !t.is_empty())
                        .ok_or_else(|| {
                            ProbeError::validation(format!(
                                "catalog probe needs an access token in {}",
                                access_token_env
                            ))
                        })?;
                    let mut client = CatalogClient::new(base_url, token);
                    if let Some(t) = timeout {
                        client = client.with_timeout(t);
                    }
                    let id = id.clone().unwrap_or_else(|| default_id("catalog"));
                    engine.add_probe(Box::new(
                        CatalogProbe::new(client, category_name, item_name, item_description)
                            .with_id(id),
                    ));
                }
            }
        }

        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML_PLAN: &str = r#"
fail_fast: true
probes:
  - kind: health
    base_url: http://localhost:8080
  - kind: sms
    id: relay-sms
    base_url: http://localhost:8080
    from: "+19404656984"
    body: pipe burst
    dialect: relay
  - kind: stream
    base_url: ws://localhost:8080
    call_sid: CA0001
  - kind: catalog
    category_name: Plumbing
    item_name: Drain cleaning
"#;

    #[test]
    fn test_yaml_plan_defaults() {
        let plan: ProbePlan = serde_yaml::from_str(YAML_PLAN).unwrap();
        assert!(plan.fail_fast);
        assert_eq!(plan.probes.len(), 4);

        match &plan.probes[2] {
            ProbeSpec::Stream {
                frames,
                chunk_bytes,
                pacing_ms,
                ..
            } => {
                assert_eq!(*frames, 3);
                assert_eq!(*chunk_bytes, DEFAULT_CHUNK_BYTES);
                assert_eq!(*pacing_ms, DEFAULT_FRAME_MS);
            }
            other => panic!("unexpected probe {:?}", other),
        }

        match &plan.probes[3] {
            ProbeSpec::Catalog {
                base_url,
                access_token_env,
                ..
            } => {
                assert_eq!(base_url, DEFAULT_CATALOG_URL);
                assert_eq!(access_token_env, DEFAULT_TOKEN_ENV);
            }
            other => panic!("unexpected probe {:?}", other),
        }
    }

    #[test]
    fn test_build_engine_ids() {
        let plan: ProbePlan = serde_yaml::from_str(YAML_PLAN).unwrap();
        let engine = plan
            .build_engine_with(|_| Some("sandbox-token".to_string()))
            .unwrap();
        assert_eq!(
            engine.probe_ids(),
            vec!["health-1", "relay-sms", "stream-3", "catalog-4"]
        );
    }

    #[test]
    fn test_catalog_requires_token() {
        let plan: ProbePlan = serde_yaml::from_str(YAML_PLAN).unwrap();
        let err = plan.build_engine_with(|_| None).err().unwrap();
        assert!(err.is_user_error());
        assert!(err.to_string().contains(DEFAULT_TOKEN_ENV));
    }

    #[test]
    fn test_stream_chunk_bytes_override() {
        let plan: ProbePlan = serde_json::from_str(
            r#"{"probes":[{"kind":"stream","base_url":"ws://localhost:8080","call_sid":"CA9","chunk_bytes":320}]}"#,
        )
        .unwrap();
        match &plan.probes[0] {
            ProbeSpec::Stream { chunk_bytes, .. } => assert_eq!(*chunk_bytes, 320),
            other => panic!("unexpected probe {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: std::result::Result<ProbePlan, _> =
            serde_json::from_str(r#"{"probes":[{"kind":"fax","base_url":"x"}]}"#);
        assert!(result.is_err());
    }
}
