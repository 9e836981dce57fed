//! Probe implementations
//!
//! Each probe runs its steps strictly in order. The first failing step ends
//! the run and every later step is reported as skipped.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::client::{CatalogClient, MediaStreamClient, WebhookClient};
use crate::contracts::*;
use crate::engine::Probe;
use crate::error::ProbeError;

fn skip_rest(report: &mut ProbeReport, steps: &[&str], failed_step: &str) {
    for step in steps {
        report.skip(*step, format!("{} failed", failed_step));
    }
}

/// Webhook server liveness probe
pub struct HealthProbe {
    id: String,
    client: WebhookClient,
}

impl HealthProbe {
    pub fn new(client: WebhookClient) -> Self {
        Self {
            id: "health".to_string(),
            client,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Probe for HealthProbe {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::Health
    }

    fn run(&self) -> Pin<Box<dyn Future<Output = ProbeReport> + Send + '_>> {
        Box::pin(async move {
            let mut report = ProbeReport::begin(&self.id, ProbeKind::Health);
            match self.client.health().await {
                Ok(health) => report.pass("health", format!("{}: {}", health.status, health.message)),
                Err(e) => report.fail("health", &e),
            }
            report.finish()
        })
    }
}

/// SMS webhook probe: health, post the form, check the acknowledgment
pub struct SmsProbe {
    id: String,
    client: WebhookClient,
    message: SmsMessage,
    dialect: SmsDialect,
}

impl SmsProbe {
    pub fn new(client: WebhookClient, message: SmsMessage, dialect: SmsDialect) -> Self {
        Self {
            id: "sms".to_string(),
            client,
            message,
            dialect,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Check that the acknowledgment echoes the normalized message
pub fn verify_ack(sent: &SmsMessage, ack: &SmsWebhookResponse) -> Result<(), ProbeError> {
    if ack.from != sent.from {
        return Err(ProbeError::malformed(format!(
            "acknowledged sender {:?}, sent {:?}",
            ack.from, sent.from
        )));
    }
    if ack.body.as_deref() != Some(sent.body.as_str()) {
        return Err(ProbeError::malformed(format!(
            "acknowledged body {:?}, sent {:?}",
            ack.body, sent.body
        )));
    }
    if ack.to.is_some() && ack.to != sent.to {
        return Err(ProbeError::malformed(format!(
            "acknowledged recipient {:?}, sent {:?}",
            ack.to, sent.to
        )));
    }
    Ok(())
}

impl Probe for SmsProbe {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::Sms
    }

    fn run(&self) -> Pin<Box<dyn Future<Output = ProbeReport> + Send + '_>> {
        Box::pin(async move {
            let mut report = ProbeReport::begin(&self.id, ProbeKind::Sms);

            match self.client.health().await {
                Ok(health) => report.pass("health", health.status),
                Err(e) => {
                    report.fail("health", &e);
                    skip_rest(&mut report, &["post_sms", "verify_ack"], "health");
                    return report.finish();
                }
            }

            let ack = match self.client.send_sms(&self.message, self.dialect).await {
                Ok(ack) => {
                    report.pass("post_sms", format!("{:?} form accepted", self.dialect));
                    ack
                }
                Err(e) => {
                    report.fail("post_sms", &e);
                    skip_rest(&mut report, &["verify_ack"], "post_sms");
                    return report.finish();
                }
            };

            match verify_ack(&self.message, &ack) {
                Ok(()) => report.pass(
                    "verify_ack",
                    format!(
                        "from={} body={:?}",
                        ack.from.as_deref().unwrap_or("-"),
                        ack.body.as_deref().unwrap_or_default()
                    ),
                ),
                Err(e) => report.fail("verify_ack", &e),
            }

            report.finish()
        })
    }
}

/// Streaming telephony probe: start, N media frames, stop
pub struct StreamProbe {
    id: String,
    client: MediaStreamClient,
    call_sid: String,
    frames: u32,
    chunk_bytes: usize,
    pacing: Duration,
}

impl StreamProbe {
    pub fn new(client: MediaStreamClient, call_sid: impl Into<String>) -> Self {
        Self {
            id: "stream".to_string(),
            client,
            call_sid: call_sid.into(),
            frames: 3,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            pacing: Duration::from_millis(DEFAULT_FRAME_MS),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Number of media frames to send (zero is allowed)
    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    /// Bytes of audio per media frame before base64
    pub fn with_chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = bytes;
        self
    }

    /// Delay between events
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Probe for StreamProbe {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::Stream
    }

    fn run(&self) -> Pin<Box<dyn Future<Output = ProbeReport> + Send + '_>> {
        Box::pin(async move {
            let mut report = ProbeReport::begin(&self.id, ProbeKind::Stream);

            if self.chunk_bytes == 0 {
                report.fail("connect", &ProbeError::validation("chunk size must be positive"));
                skip_rest(&mut report, &["start", "media", "stop", "close"], "connect");
                return report.finish();
            }

            let connected = match self.client.connect(&self.call_sid).await {
                Ok(c) => {
                    report.pass("connect", c.url().to_string());
                    c
                }
                Err(e) => {
                    report.fail("connect", &e);
                    skip_rest(&mut report, &["start", "media", "stop", "close"], "connect");
                    return report.finish();
                }
            };

            let mut started = match connected.start(StartPayload::for_call(&self.call_sid)).await {
                Ok(s) => {
                    report.pass("start", s.stream_sid().to_string());
                    s
                }
                Err(e) => {
                    report.fail("start", &e);
                    skip_rest(&mut report, &["media", "stop", "close"], "start");
                    return report.finish();
                }
            };

            let audio = silence(self.chunk_bytes);
            for _ in 0..self.frames {
                tokio::time::sleep(self.pacing).await;
                if let Err(e) = started.send_media(&audio).await {
                    report.fail("media", &e);
                    skip_rest(&mut report, &["stop", "close"], "media");
                    return report.finish();
                }
            }
            report.pass("media", format!("{} frames sent", started.frames_sent()));

            tokio::time::sleep(self.pacing).await;
            let stopped = match started.stop().await {
                Ok(s) => {
                    report.pass("stop", "stop event sent");
                    s
                }
                Err(e) => {
                    report.fail("stop", &e);
                    skip_rest(&mut report, &["close"], "stop");
                    return report.finish();
                }
            };

            match stopped.close().await {
                Ok(summary) => report.pass("close", summary.events.join(",")),
                Err(e) => report.fail("close", &e),
            }

            report.finish()
        })
    }
}

/// Catalog probe: create a category, then an item referencing it
///
/// The item step runs only with the server-assigned category id, so a
/// failed category step can never leave an orphaned item behind.
pub struct CatalogProbe {
    id: String,
    client: CatalogClient,
    category_name: String,
    item_name: String,
    item_description: String,
}

impl CatalogProbe {
    pub fn new(
        client: CatalogClient,
        category_name: impl Into<String>,
        item_name: impl Into<String>,
        item_description: impl Into<String>,
    ) -> Self {
        Self {
            id: "catalog".to_string(),
            client,
            category_name: category_name.into(),
            item_name: item_name.into(),
            item_description: item_description.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Probe for CatalogProbe {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::Catalog
    }

    fn run(&self) -> Pin<Box<dyn Future<Output = ProbeReport> + Send + '_>> {
        Box::pin(async move {
            let mut report = ProbeReport::begin(&self.id, ProbeKind::Catalog);

            let category = match self.client.create_category(&self.category_name).await {
                Ok(category) => {
                    report.pass("create_category", format!("id={}", category.id));
                    category
                }
                Err(e) => {
                    report.fail("create_category", &e);
                    skip_rest(&mut report, &["create_item"], "create_category");
                    return report.finish();
                }
            };

            let draft = ItemDraft::in_category(&self.item_name, &self.item_description, &category);
            match self.client.create_item(draft).await {
                Ok(item) => report.pass(
                    "create_item",
                    format!("id={} category_id={}", item.id, item.category_id),
                ),
                Err(e) => report.fail("create_item", &e),
            }

            report.finish()
        })
    }
}
