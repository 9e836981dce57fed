//! Ringside integration probes
//!
//! Short-lived checks of the external integrations behind the Ringside
//! phone/SMS automation service:
//! - the commerce catalog API (category then item creation)
//! - the inbound SMS webhook (form post, normalized acknowledgement)
//! - the telephony media stream (start, media frames, stop over WebSocket)
//!
//! The crate also carries the minimal webhook server those inbound probes
//! run against, so the whole loop can be exercised locally.

pub mod client;
pub mod contracts;
pub mod engine;
pub mod error;
pub mod handler;
pub mod normalize;
pub mod output;
pub mod plan;
pub mod telemetry;

pub use contracts::*;
pub use error::{ProbeError, Result};
