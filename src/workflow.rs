//! Scan, plan, execute, and report for one normalization pass.
use crate::cli::Command;
use crate::config::{load_config, LayoutConfig};
use crate::execute::{Executor, Mode};
use crate::pattern::AnomalyPattern;
use crate::plan::{PlanItem, Planner};
use crate::report::{render_entry, render_json, render_summary, ExecutionReport, ReportEntry};
use crate::scan::Scanner;
use anyhow::Result;
use std::path::Path;

/// Run the pass selected on the command line and print its report.
pub fn run(command: &Command) -> Result<ExecutionReport> {
    let common = command.common();
    let config = load_config(common.config.as_deref())?;
    let pattern = command.pattern();
    let root = command.root();
    let mode = Mode::from_dry_run(common.dry_run);
    let json = common.json;

    if !json {
        println!("Scanning {} for {pattern} anomalies", root.display());
        if mode == Mode::DryRun {
            println!("DRY RUN - no changes will be made");
        }
    }
    let report = normalize(root, pattern, &config, mode, |position, total, entry| {
        if json {
            return;
        }
        if position == 1 {
            println!("Found {total} {pattern} item(s)");
        }
        print!("{}", render_entry(position, total, entry));
    })?;

    if json {
        println!("{}", render_json(&report)?);
    } else if report.entries.is_empty() {
        println!("No cleanup needed!");
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(report)
}

/// Normalize `root` for one pattern.
///
/// Fails only when the root is missing; every per-item problem ends up in
/// the returned report. `on_entry` sees each outcome as soon as it is known.
pub fn normalize<F>(
    root: &Path,
    pattern: AnomalyPattern,
    config: &LayoutConfig,
    mode: Mode,
    mut on_entry: F,
) -> Result<ExecutionReport>
where
    F: FnMut(usize, usize, &ReportEntry),
{
    let scanner = Scanner::new(root, config)?;
    let mut planner = Planner::new(scanner.root(), config);
    let executor = Executor::new(mode, scanner.root(), config);

    let plan: Vec<PlanItem> = scanner
        .scan(pattern)
        .map(|anomaly| planner.plan(&anomaly))
        .collect();
    tracing::info!(
        root = %root.display(),
        %pattern,
        target = %pattern.target_layout(config),
        matched = plan.len(),
        with_work = plan.iter().filter(|item| item.has_work()).count(),
        "scan complete"
    );

    let mut report = ExecutionReport::new(pattern, executor.mode(), root.display().to_string());
    let total = plan.len();
    for (index, item) in plan.iter().enumerate() {
        let entry = executor.execute(item);
        tracing::debug!(
            item = %entry.item,
            pattern = %item.pattern,
            outcome = ?entry.outcome,
            "item done"
        );
        on_entry(index + 1, total, &entry);
        report.record(entry);
    }
    let counts = report.counts();
    tracing::info!(
        succeeded = counts.succeeded,
        failed = counts.failed,
        skipped = counts.skipped,
        "normalization finished"
    );
    Ok(report)
}
