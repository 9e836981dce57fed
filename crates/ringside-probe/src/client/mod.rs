//! Clients for the collaborators the probes exercise
//!
//! - [`CatalogClient`]: commerce catalog object creation
//! - [`WebhookClient`]: webhook server health and SMS endpoints
//! - [`MediaStreamClient`]: telephony media-stream WebSocket

mod catalog;
mod stream;
mod webhook;

pub use catalog::{CatalogClient, API_VERSION_HEADER, DEFAULT_API_VERSION};
pub use stream::{ConnectedStream, MediaStreamClient, StartedStream, StoppedStream, StreamSummary};
pub use webhook::WebhookClient;

use std::time::Duration;

/// Fixed per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
