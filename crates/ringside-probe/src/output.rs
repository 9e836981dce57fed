//! CLI output formatting
//!
//! Reports render as a colored table for people or as JSON/YAML for
//! scripts and CI.

use anyhow::Context;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt::Write;

use crate::contracts::{ProbeReport, RunSummary, StepStatus};

/// Output format options
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table with colors
    #[default]
    Table,
    /// JSON for machine processing
    Json,
    /// YAML
    Yaml,
}

/// Serialize any value in a structured format
pub fn render_structured<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("failed to encode YAML"),
        OutputFormat::Json | OutputFormat::Table => {
            serde_json::to_string_pretty(value).context("failed to encode JSON")
        }
    }
}

/// Render a run summary
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(summary_table(summary)),
        _ => render_structured(summary, format),
    }
}

/// Render a single probe report
pub fn render_report(report: &ProbeReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(report_table(report)),
        _ => render_structured(report, format),
    }
}

fn marker(status: StepStatus) -> ColoredString {
    match status {
        StepStatus::Passed => "[PASS]".green().bold(),
        StepStatus::Failed => "[FAIL]".red().bold(),
        StepStatus::Skipped => "[SKIP]".yellow(),
    }
}

fn report_table(report: &ProbeReport) -> String {
    let mut out = String::new();

    let status = if report.passed() {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };

    let _ = writeln!(
        out,
        "{} {} ({}) {}",
        report.probe.cyan().bold(),
        status,
        report.kind.as_str(),
        format!("{}ms", report.duration_ms).dimmed()
    );

    for step in &report.steps {
        let _ = write!(out, "  {} {:<16}", marker(step.status), step.name);
        if let Some(detail) = &step.detail {
            let _ = write!(out, " {}", detail);
        }
        out.push('\n');
    }

    if let (Some(kind), Some(error)) = (&report.error_kind, &report.error) {
        let _ = writeln!(out, "  {} {}", format!("{} error:", kind).red(), error);
    }

    out
}

fn summary_table(summary: &RunSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Probe Results".cyan().bold());
    let _ = writeln!(out, "{}", "=".repeat(60));

    for report in &summary.reports {
        out.push('\n');
        out.push_str(&report_table(report));
    }

    let _ = writeln!(out, "\n{}", "-".repeat(60));
    let totals = format!(
        "{} passed, {} failed in {}ms",
        summary.passed, summary.failed, summary.duration_ms
    );
    if summary.all_passed() {
        let _ = writeln!(out, "{}", totals.green());
    } else {
        let _ = writeln!(out, "{}", totals.red());
    }

    out
}
