//! Probe contracts
//!
//! Wire types for the collaborators the probes talk to, and the report
//! every probe produces.

mod catalog;
mod sms;
mod stream;

pub use catalog::*;
pub use sms::*;
pub use stream::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Integration exercised by a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Webhook server liveness
    Health,
    /// SMS webhook round trip
    Sms,
    /// Telephony media stream
    Stream,
    /// Commerce catalog category + item creation
    Catalog,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Health => "health",
            ProbeKind::Sms => "sms",
            ProbeKind::Stream => "stream",
            ProbeKind::Catalog => "catalog",
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    /// Not attempted because an earlier step failed
    Skipped,
}

/// One step of a probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStep {
    pub name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall outcome of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Passed,
    Failed,
}

/// Result of running one probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Probe identifier
    pub probe: String,

    /// Integration exercised
    pub kind: ProbeKind,

    /// Overall status
    pub status: ProbeStatus,

    /// Steps in execution order
    pub steps: Vec<ProbeStep>,

    /// Error that ended the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error category (`transport`, `api`, `validation`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    /// Start timestamp
    pub started_at: DateTime<Utc>,

    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl ProbeReport {
    /// Start an empty report; it passes unless a step fails
    pub fn begin(probe: impl Into<String>, kind: ProbeKind) -> Self {
        Self {
            probe: probe.into(),
            kind,
            status: ProbeStatus::Passed,
            steps: Vec::new(),
            error: None,
            error_kind: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    /// Record a passed step
    pub fn pass(&mut self, step: impl Into<String>, detail: impl Into<String>) {
        self.steps.push(ProbeStep {
            name: step.into(),
            status: StepStatus::Passed,
            detail: Some(detail.into()),
        });
    }

    /// Record a failed step; the probe fails with this error
    pub fn fail(&mut self, step: impl Into<String>, error: &ProbeError) {
        self.steps.push(ProbeStep {
            name: step.into(),
            status: StepStatus::Failed,
            detail: Some(error.to_string()),
        });
        self.status = ProbeStatus::Failed;
        if self.error.is_none() {
            self.error = Some(error.to_string());
            self.error_kind = Some(error.kind().to_string());
        }
    }

    /// Record a step that was not attempted
    pub fn skip(&mut self, step: impl Into<String>, reason: impl Into<String>) {
        self.steps.push(ProbeStep {
            name: step.into(),
            status: StepStatus::Skipped,
            detail: Some(reason.into()),
        });
    }

    /// Stamp the elapsed time since `begin`
    pub fn finish(mut self) -> Self {
        let elapsed = Utc::now() - self.started_at;
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == ProbeStatus::Passed
    }

    /// Find a step by name
    pub fn step(&self, name: &str) -> Option<&ProbeStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Aggregated result of running several probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub reports: Vec<ProbeReport>,
    pub passed: u32,
    pub failed: u32,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_reports(reports: Vec<ProbeReport>, duration_ms: u64) -> Self {
        let passed = reports.iter().filter(|r| r.passed()).count() as u32;
        let failed = reports.len() as u32 - passed;
        Self {
            reports,
            passed,
            failed,
            duration_ms,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
