//! Snapshot and operation types passed between pipeline stages.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

/// Filesystem entry captured once at scan time.
///
/// Planning reads only these snapshots; nothing re-stats the tree between
/// scanning and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub path: PathBuf,
    pub kind: NodeKind,
    pub size: u64,
    pub modified: SystemTime,
}

impl TreeNode {
    pub fn capture(path: &Path) -> Result<Self> {
        let metadata =
            fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        let kind = if metadata.is_dir() {
            NodeKind::Dir
        } else {
            NodeKind::File
        };
        let modified = metadata
            .modified()
            .with_context(|| format!("read mtime {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            size: if kind == NodeKind::File { metadata.len() } else { 0 },
            modified,
        })
    }

    /// Capture `path` if it exists with the expected kind.
    pub fn capture_if(path: &Path, kind: NodeKind) -> Option<Self> {
        Self::capture(path).ok().filter(|node| node.kind == kind)
    }

    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Rename `source` to the vacant `destination`.
    Move,
    /// Delete the entry at `destination`, then rename `source` onto it.
    Replace,
    /// Delete `source`; `destination` is the surviving copy.
    DeleteDuplicate,
    /// Leave `source` in place.
    Skip,
    /// Create the directory at `destination`.
    CreateDir,
    /// Recursively remove `source` once it holds no artifact.
    RemoveDir,
}

impl Action {
    pub fn mutates(self) -> bool {
        !matches!(self, Action::Skip)
    }
}

/// One planned filesystem change, consumed exactly once by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOperation {
    pub action: Action,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub rationale: String,
}

impl MoveOperation {
    pub fn new(
        action: Action,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            action,
            source: source.into(),
            destination: destination.into(),
            rationale: rationale.into(),
        }
    }
}
