//! Planning: turn scanner snapshots into ordered filesystem operations.
//!
//! The planner never touches the filesystem. It reads the snapshot carried by
//! each [`Anomaly`] plus what earlier items of the same batch will leave at
//! their destinations, so the same batch of snapshots always yields the same
//! plans in both modes.
pub mod conflict;

use crate::config::LayoutConfig;
use crate::model::{Action, MoveOperation, TreeNode};
use crate::pattern::{sample_name, AnomalyPattern};
use crate::report::FailureKind;
use crate::scan::{
    Anomaly, FlatSampleSnapshot, MisplacedArtifactSnapshot, TimestampFolderSnapshot,
};
use crate::util::display_path;
use conflict::{resolve, ConflictPolicy, Survivor};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// What the executor should do with a planned item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Run every operation.
    Ready,
    /// Run every operation, then report the item as failed: some entries
    /// could not be placed and were left where they are.
    Conflicted { message: String },
    /// Nothing to do.
    Skip { reason: String },
    /// Matched but cannot be normalized.
    Fail { kind: FailureKind, message: String },
}

/// Plan for one matched subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    /// Anchor path relative to the scan root.
    pub id: String,
    pub pattern: AnomalyPattern,
    pub operations: Vec<MoveOperation>,
    pub disposition: Disposition,
    /// Set when a conflict policy decided between two candidates.
    pub conflict: Option<String>,
}

impl PlanItem {
    fn ready(id: String, pattern: AnomalyPattern, operations: Vec<MoveOperation>) -> Self {
        Self {
            id,
            pattern,
            operations,
            disposition: Disposition::Ready,
            conflict: None,
        }
    }

    fn skip(id: String, pattern: AnomalyPattern, reason: impl Into<String>) -> Self {
        Self {
            id,
            pattern,
            operations: Vec::new(),
            disposition: Disposition::Skip {
                reason: reason.into(),
            },
            conflict: None,
        }
    }

    fn fail(
        id: String,
        pattern: AnomalyPattern,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            pattern,
            operations: Vec::new(),
            disposition: Disposition::Fail {
                kind,
                message: message.into(),
            },
            conflict: None,
        }
    }

    /// Whether executing this item can change the tree.
    pub fn has_work(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::Ready | Disposition::Conflicted { .. }
        ) && self.operations.iter().any(|op| op.action.mutates())
    }
}

/// Side-effect-free planner bound to one root and layout.
///
/// Plan items in execution order: each planned destination is remembered so
/// a later item targeting the same path resolves against it.
#[derive(Debug, Clone)]
pub struct Planner {
    root: PathBuf,
    config: LayoutConfig,
    /// Destination -> artifact that will occupy it once earlier items run.
    claimed: BTreeMap<PathBuf, TreeNode>,
}

impl Planner {
    pub fn new(root: &Path, config: &LayoutConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config: config.clone(),
            claimed: BTreeMap::new(),
        }
    }

    pub fn plan(&mut self, anomaly: &Anomaly) -> PlanItem {
        let id = display_path(anomaly.anchor(), Some(&self.root));
        match anomaly {
            Anomaly::TimestampFolder(snapshot) => self.plan_timestamp_folder(id, snapshot),
            Anomaly::MisplacedArtifact(snapshot) => self.plan_misplaced_artifact(id, snapshot),
            Anomaly::FlatSampleIndex(snapshot) => self.plan_flat_samples(id, snapshot),
        }
    }

    /// Entry expected at `target` when this item runs.
    fn occupant(&self, target: &Path, scanned: Option<&TreeNode>) -> Option<TreeNode> {
        self.claimed.get(target).or(scanned).cloned()
    }

    fn claim(&mut self, target: &Path, survivor: &TreeNode) {
        self.claimed.insert(
            target.to_path_buf(),
            TreeNode {
                path: target.to_path_buf(),
                ..survivor.clone()
            },
        );
    }

    fn plan_timestamp_folder(&mut self, id: String, snapshot: &TimestampFolderSnapshot) -> PlanItem {
        let pattern = AnomalyPattern::TimestampFolder;
        let folder = &snapshot.folder.path;
        let Some(parent) = folder.parent() else {
            return PlanItem::fail(
                id,
                pattern,
                FailureKind::NoPayloadFound,
                "timestamp folder has no parent",
            );
        };
        let Some(payload) = newest(&snapshot.artifacts) else {
            return PlanItem::fail(
                id,
                pattern,
                FailureKind::NoPayloadFound,
                format!(
                    "no .{} files found in {}",
                    self.config.artifact_extension,
                    snapshot.folder.name()
                ),
            );
        };

        let mut operations = Vec::new();
        for extra in snapshot.artifacts.iter().filter(|node| *node != payload) {
            operations.push(MoveOperation::new(
                Action::DeleteDuplicate,
                &extra.path,
                &payload.path,
                format!("superseded by newer {}", payload.name()),
            ));
        }

        let target = parent.join(&self.config.canonical_artifact);
        let mut conflict_note = None;
        let survivor = match self.occupant(&target, snapshot.existing.as_ref()) {
            None => {
                operations.push(MoveOperation::new(
                    Action::Move,
                    &payload.path,
                    &target,
                    format!("lift {} out of {}", payload.name(), snapshot.folder.name()),
                ));
                payload.clone()
            }
            Some(existing) => {
                let policy = ConflictPolicy::PreferNewerMtime;
                let resolution = resolve(policy, payload, &existing);
                conflict_note = Some(resolution.note(policy));
                operations.push(match resolution.survivor {
                    Survivor::Incoming => MoveOperation::new(
                        Action::Replace,
                        &payload.path,
                        &target,
                        "replace older artifact",
                    ),
                    Survivor::Existing => MoveOperation::new(
                        Action::DeleteDuplicate,
                        &payload.path,
                        &target,
                        "kept existing newer artifact",
                    ),
                });
                resolution.kept.clone()
            }
        };
        self.claim(&target, &survivor);
        operations.push(MoveOperation::new(
            Action::RemoveDir,
            folder,
            parent,
            format!("remove {}", snapshot.folder.name()),
        ));

        let mut item = PlanItem::ready(id, pattern, operations);
        item.conflict = conflict_note;
        item
    }

    fn plan_misplaced_artifact(
        &mut self,
        id: String,
        snapshot: &MisplacedArtifactSnapshot,
    ) -> PlanItem {
        let pattern = AnomalyPattern::MisplacedArtifact;
        let Some(run) = snapshot
            .run_dirs
            .iter()
            .max_by(|a, b| {
                a.dir
                    .modified
                    .cmp(&b.dir.modified)
                    .then_with(|| a.dir.path.cmp(&b.dir.path))
            })
        else {
            return PlanItem::skip(id, pattern, "no run directories");
        };
        let Some(placeholder) = &run.placeholder else {
            return PlanItem::skip(
                id,
                pattern,
                format!(
                    "newest run {} has no {}/ placeholder",
                    run.dir.name(),
                    self.config.placeholder_dir
                ),
            );
        };

        let target = placeholder.path.join(&self.config.canonical_artifact);
        let artifact = &snapshot.artifact;
        let mut conflict_note = None;
        let (operation, survivor) = match self.occupant(&target, run.existing.as_ref()) {
            None => (
                MoveOperation::new(
                    Action::Move,
                    &artifact.path,
                    &target,
                    format!("move into {}", run.dir.name()),
                ),
                artifact.clone(),
            ),
            Some(existing) => {
                let policy = ConflictPolicy::PreferLargerSize;
                let resolution = resolve(policy, artifact, &existing);
                conflict_note = Some(resolution.note(policy));
                let operation = match resolution.survivor {
                    Survivor::Incoming => MoveOperation::new(
                        Action::Replace,
                        &artifact.path,
                        &target,
                        "replace smaller file",
                    ),
                    Survivor::Existing => MoveOperation::new(
                        Action::DeleteDuplicate,
                        &artifact.path,
                        &target,
                        "removed duplicate (kept larger file)",
                    ),
                };
                (operation, resolution.kept.clone())
            }
        };
        self.claim(&target, &survivor);

        let mut item = PlanItem::ready(id, pattern, vec![operation]);
        item.conflict = conflict_note;
        item
    }

    fn plan_flat_samples(&self, id: String, snapshot: &FlatSampleSnapshot) -> PlanItem {
        let pattern = AnomalyPattern::FlatSampleIndex;
        let label = &snapshot.name.label;
        if snapshot.samples.is_empty() {
            if !snapshot.unindexed.is_empty() {
                let names: Vec<&str> = snapshot.unindexed.iter().map(TreeNode::name).collect();
                return PlanItem::skip(
                    id,
                    pattern,
                    format!("sample index out of range, left in place: {}", names.join(", ")),
                );
            }
            let reason = if snapshot.nested.is_some() {
                "already restructured"
            } else {
                "no numbered sample folders"
            };
            return PlanItem::skip(id, pattern, reason);
        }

        let nested = snapshot.task_folder.path.join(label);
        if snapshot.samples.iter().any(|sample| sample.node.path == nested) {
            return PlanItem::fail(
                id,
                pattern,
                FailureKind::DestinationConflict,
                format!("label folder {label} collides with a sample folder"),
            );
        }

        let mut operations = Vec::new();
        if snapshot.nested.is_none() {
            operations.push(MoveOperation::new(
                Action::CreateDir,
                &snapshot.task_folder.path,
                &nested,
                format!("create {label}/"),
            ));
        }

        let mut taken: BTreeSet<String> = snapshot.nested_entries.iter().cloned().collect();
        let mut left_in_place = Vec::new();
        for sample in &snapshot.samples {
            let new_name = sample_name(label, sample.index);
            let destination = nested.join(&new_name);
            if taken.insert(new_name.clone()) {
                operations.push(MoveOperation::new(
                    Action::Move,
                    &sample.node.path,
                    &destination,
                    format!("rename {} -> {label}/{new_name}", sample.node.name()),
                ));
            } else {
                operations.push(MoveOperation::new(
                    Action::Skip,
                    &sample.node.path,
                    &destination,
                    format!("{label}/{new_name} already exists"),
                ));
                left_in_place.push(sample.node.name().to_string());
            }
        }
        for node in &snapshot.unindexed {
            operations.push(MoveOperation::new(
                Action::Skip,
                &node.path,
                &nested,
                "sample index out of range",
            ));
        }

        let mut item = PlanItem::ready(id, pattern, operations);
        if !left_in_place.is_empty() {
            item.disposition = Disposition::Conflicted {
                message: format!(
                    "left {} sample folder(s) in place, destination exists: {}",
                    left_in_place.len(),
                    left_in_place.join(", ")
                ),
            };
        }
        item
    }
}

/// Newest artifact by mtime; ties go to the first in name order.
fn newest(artifacts: &[TreeNode]) -> Option<&TreeNode> {
    let mut iter = artifacts.iter();
    let first = iter.next()?;
    Some(iter.fold(first, |best, candidate| {
        match resolve(ConflictPolicy::PreferNewerMtime, candidate, best).survivor {
            Survivor::Incoming => candidate,
            Survivor::Existing => best,
        }
    }))
}
