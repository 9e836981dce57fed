//! Prometheus metrics for the webhook server
//!
//! - `ringside_webhook_requests_total` (counter) - requests by endpoint and result
//! - `ringside_stream_events_total` (counter) - accepted media-stream events by type
//! - `ringside_streams_total` (counter) - closed media streams by outcome
//! - `ringside_data_store_info` (gauge) - data store endpoint the server was started with

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Webhook server metrics, each instance with its own registry
pub struct WebhookMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    stream_events_total: IntCounterVec,
    streams_total: IntCounterVec,
    data_store_info: IntGaugeVec,
}

impl std::fmt::Debug for WebhookMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookMetrics").finish_non_exhaustive()
    }
}

impl WebhookMetrics {
    /// Create and register all metrics
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "webhook_requests_total",
                "Webhook requests handled, by endpoint and result",
            )
            .namespace("ringside"),
            &["endpoint", "result"],
        )?;

        let stream_events_total = IntCounterVec::new(
            Opts::new(
                "stream_events_total",
                "Media-stream events accepted, by event type",
            )
            .namespace("ringside"),
            &["event"],
        )?;

        let streams_total = IntCounterVec::new(
            Opts::new("streams_total", "Media streams closed, by outcome").namespace("ringside"),
            &["outcome"],
        )?;

        let data_store_info = IntGaugeVec::new(
            Opts::new("data_store_info", "Data store endpoint in use").namespace("ringside"),
            &["endpoint"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(stream_events_total.clone()))?;
        registry.register(Box::new(streams_total.clone()))?;
        registry.register(Box::new(data_store_info.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            stream_events_total,
            streams_total,
            data_store_info,
        })
    }

    pub fn record_request(&self, endpoint: &str, result: &str) {
        self.requests_total
            .with_label_values(&[endpoint, result])
            .inc();
    }

    pub fn record_stream_event(&self, event: &str) {
        self.stream_events_total.with_label_values(&[event]).inc();
    }

    /// Outcome is `completed`, `incomplete` or `rejected`
    pub fn record_stream_closed(&self, outcome: &str) {
        self.streams_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_data_store(&self, endpoint: &str) {
        self.data_store_info.reset();
        self.data_store_info.with_label_values(&[endpoint]).set(1);
    }

    pub fn request_count(&self, endpoint: &str, result: &str) -> u64 {
        self.requests_total
            .with_label_values(&[endpoint, result])
            .get()
    }

    pub fn stream_event_count(&self, event: &str) -> u64 {
        self.stream_events_total.with_label_values(&[event]).get()
    }

    pub fn stream_count(&self, outcome: &str) -> u64 {
        self.streams_total.with_label_values(&[outcome]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
