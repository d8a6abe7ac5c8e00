//! Plan execution against the real filesystem, or a narrated dry run.
//!
//! Operations of one item run in order and stop at the first failure; the
//! caller moves on to the next item regardless.
use crate::config::LayoutConfig;
use crate::model::{Action, MoveOperation};
use crate::plan::{Disposition, PlanItem};
use crate::report::{FailureKind, Outcome, ReportEntry};
use crate::util::{display_path, find_file_in_subtree};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Apply,
    DryRun,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Mode::DryRun
        } else {
            Mode::Apply
        }
    }
}

/// Applies planned items; the only stage that writes to the tree.
#[derive(Debug, Clone)]
pub struct Executor {
    mode: Mode,
    root: PathBuf,
    config: LayoutConfig,
}

impl Executor {
    pub fn new(mode: Mode, root: &Path, config: &LayoutConfig) -> Self {
        Self {
            mode,
            root: root.to_path_buf(),
            config: config.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Execute one item and describe what happened.
    pub fn execute(&self, item: &PlanItem) -> ReportEntry {
        let mut entry = ReportEntry {
            item: item.id.clone(),
            outcome: Outcome::Succeeded,
            failure: None,
            message: String::new(),
            conflict: item.conflict.clone(),
            trace: Vec::new(),
        };
        match &item.disposition {
            Disposition::Skip { reason } => {
                entry.outcome = Outcome::Skipped;
                entry.message = reason.clone();
                return entry;
            }
            Disposition::Fail { kind, message } => {
                entry.outcome = Outcome::Failed;
                entry.failure = Some(*kind);
                entry.message = message.clone();
                return entry;
            }
            Disposition::Ready | Disposition::Conflicted { .. } => {}
        }

        for operation in &item.operations {
            match self.run_operation(operation) {
                Ok(line) => entry.trace.push(line),
                Err(err) => {
                    let message = format!("{err:#}");
                    tracing::warn!(item = %item.id, error = %message, "operation failed");
                    entry.outcome = Outcome::Failed;
                    entry.failure = Some(FailureKind::FilesystemOperationFailed);
                    entry.message = message;
                    return entry;
                }
            }
        }

        if let Disposition::Conflicted { message } = &item.disposition {
            entry.outcome = Outcome::Failed;
            entry.failure = Some(FailureKind::DestinationConflict);
            entry.message = message.clone();
            return entry;
        }
        entry.message = match self.mode {
            Mode::Apply => format!("{} operation(s) applied", item.operations.len()),
            Mode::DryRun => format!("{} operation(s) planned", item.operations.len()),
        };
        entry
    }

    fn run_operation(&self, op: &MoveOperation) -> Result<String> {
        let line = self.narrate(op);
        if self.mode == Mode::DryRun || op.action == Action::Skip {
            return Ok(line);
        }
        tracing::debug!(
            action = ?op.action,
            source = %op.source.display(),
            destination = %op.destination.display(),
            "apply operation"
        );
        match op.action {
            Action::Move => {
                if op.destination.exists() {
                    return Err(anyhow!(
                        "destination already exists: {}",
                        op.destination.display()
                    ));
                }
                fs::rename(&op.source, &op.destination).with_context(|| {
                    format!(
                        "move {} -> {}",
                        op.source.display(),
                        op.destination.display()
                    )
                })?;
            }
            Action::Replace => {
                fs::remove_file(&op.destination)
                    .with_context(|| format!("remove {}", op.destination.display()))?;
                fs::rename(&op.source, &op.destination).with_context(|| {
                    format!(
                        "move {} -> {}",
                        op.source.display(),
                        op.destination.display()
                    )
                })?;
            }
            Action::DeleteDuplicate => {
                if !op.destination.is_file() {
                    return Err(anyhow!(
                        "surviving copy missing: {}",
                        op.destination.display()
                    ));
                }
                fs::remove_file(&op.source)
                    .with_context(|| format!("remove {}", op.source.display()))?;
            }
            Action::CreateDir => {
                if !op.destination.is_dir() {
                    fs::create_dir(&op.destination)
                        .with_context(|| format!("create {}", op.destination.display()))?;
                }
            }
            Action::RemoveDir => {
                if let Some(left) =
                    find_file_in_subtree(&op.source, |path| self.config.is_artifact(path))
                {
                    return Err(anyhow!(
                        "refusing to remove {}: payload remains at {}",
                        op.source.display(),
                        left.display()
                    ));
                }
                fs::remove_dir_all(&op.source)
                    .with_context(|| format!("remove {}", op.source.display()))?;
            }
            Action::Skip => {}
        }
        Ok(line)
    }

    fn narrate(&self, op: &MoveOperation) -> String {
        let source = display_path(&op.source, Some(&self.root));
        let destination = display_path(&op.destination, Some(&self.root));
        let prefix = match self.mode {
            Mode::Apply => "",
            Mode::DryRun => "would ",
        };
        let body = match op.action {
            Action::Move => format!("move {source} -> {destination}"),
            Action::Replace => format!("replace {destination} with {source}"),
            Action::DeleteDuplicate => {
                format!("delete duplicate {source} (keeping {destination})")
            }
            Action::CreateDir => format!("create {destination}/"),
            Action::RemoveDir => format!("remove {source}/"),
            Action::Skip => return format!("skip {source}: {}", op.rationale),
        };
        format!("{prefix}{body} ({})", op.rationale)
    }
}
