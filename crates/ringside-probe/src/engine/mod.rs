//! Probe engine
//!
//! Runs probes one after another. Each probe owns its client and
//! configuration snapshot; nothing is shared between runs and nothing is
//! retried.

mod probes;

pub use probes::*;

use crate::contracts::*;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

/// A short-lived check of one external integration
pub trait Probe: Send + Sync {
    /// Probe identifier used in reports
    fn id(&self) -> &str;

    /// Integration exercised
    fn kind(&self) -> ProbeKind;

    /// Run the probe to completion; failures are captured in the report
    fn run(&self) -> Pin<Box<dyn Future<Output = ProbeReport> + Send + '_>>;
}

/// Sequential probe runner
#[derive(Default)]
pub struct ProbeEngine {
    probes: Vec<Box<dyn Probe>>,
    fail_fast: bool,
}

impl ProbeEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after the first failed probe
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Add a probe (builder pattern)
    pub fn with_probe<P: Probe + 'static>(mut self, probe: P) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// Add a boxed probe
    pub fn add_probe(&mut self, probe: Box<dyn Probe>) {
        self.probes.push(probe);
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Probe identifiers in run order
    pub fn probe_ids(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.id()).collect()
    }

    /// Run every probe in order
    pub async fn run(&self) -> RunSummary {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(self.probes.len());

        for probe in &self.probes {
            tracing::info!(probe = probe.id(), kind = probe.kind().as_str(), "Running probe");

            let report = probe.run().await;

            if report.passed() {
                tracing::info!(probe = probe.id(), duration_ms = report.duration_ms, "Probe passed");
            } else {
                tracing::warn!(
                    probe = probe.id(),
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "Probe failed"
                );
            }

            let failed = !report.passed();
            reports.push(report);

            if failed && self.fail_fast {
                tracing::warn!("Stopping after first failure");
                break;
            }
        }

        RunSummary::from_reports(reports, start.elapsed().as_millis() as u64)
    }
}
