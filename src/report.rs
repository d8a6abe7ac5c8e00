//! Execution report: per-item outcomes, tallies, and rendering.
//!
//! The report lives for one run. It is printed as a text trace or as JSON and
//! never written to disk.
use crate::execute::Mode;
use crate::pattern::AnomalyPattern;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;

const RULE_WIDTH: usize = 60;

/// Per-item failure categories. None of these abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Matched subtree holds no relocatable artifact.
    NoPayloadFound,
    /// A planned destination is already occupied.
    DestinationConflict,
    /// Rename, delete, or create failed on the filesystem.
    FilesystemOperationFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::NoPayloadFound => "no payload found",
            FailureKind::DestinationConflict => "destination conflict",
            FailureKind::FilesystemOperationFailed => "filesystem operation failed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub item: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub message: String,
    /// Informational note when a conflict policy picked a survivor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
    /// Operation narrative, one line per operation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_processed: usize,
}

/// Outcomes of one run, in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub pattern: AnomalyPattern,
    pub mode: Mode,
    pub root: String,
    pub entries: Vec<ReportEntry>,
}

impl ExecutionReport {
    pub fn new(pattern: AnomalyPattern, mode: Mode, root: String) -> Self {
        Self {
            pattern,
            mode,
            root,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Succeeded => counts.succeeded += 1,
                Outcome::Failed => counts.failed += 1,
                Outcome::Skipped => counts.skipped += 1,
            }
        }
        counts.attempted = counts.succeeded + counts.failed;
        counts.total_processed = counts.succeeded + counts.failed;
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.outcome == Outcome::Failed)
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    report: &'a ExecutionReport,
    counts: Counts,
}

/// Render the full report, tallies included, as pretty JSON.
pub fn render_json(report: &ExecutionReport) -> Result<String> {
    let json = ReportJson {
        report,
        counts: report.counts(),
    };
    serde_json::to_string_pretty(&json).context("serialize execution report")
}

/// Render one entry as `[i/N] item` followed by indented detail lines.
pub fn render_entry(position: usize, total: usize, entry: &ReportEntry) -> String {
    let mut out = format!("[{position}/{total}] {}\n", entry.item);
    for line in &entry.trace {
        out.push_str(&format!("   {line}\n"));
    }
    if let Some(conflict) = &entry.conflict {
        out.push_str(&format!("   conflict: {conflict}\n"));
    }
    let status = match entry.outcome {
        Outcome::Succeeded => "ok",
        Outcome::Skipped => "skipped",
        Outcome::Failed => "FAILED",
    };
    match entry.failure {
        Some(kind) => out.push_str(&format!("   {status} ({kind}): {}\n", entry.message)),
        None => out.push_str(&format!("   {status}: {}\n", entry.message)),
    }
    out
}

/// Render the closing tally.
pub fn render_summary(report: &ExecutionReport) -> String {
    let counts = report.counts();
    let mut out = String::new();
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    if report.mode == Mode::DryRun {
        out.push_str(&format!(
            "DRY RUN: would process {} item(s)\n",
            counts.total_processed
        ));
    }
    out.push_str(&format!("Succeeded: {}\n", counts.succeeded));
    out.push_str(&format!("Failed: {}\n", counts.failed));
    out.push_str(&format!("Skipped: {}\n", counts.skipped));
    out.push_str(&format!("Total processed: {}\n", counts.total_processed));
    out
}
