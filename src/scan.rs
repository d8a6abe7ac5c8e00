//! Tree scanning for anomaly subtrees.
//!
//! The scanner walks the root in file-name order and yields one snapshot per
//! match. Entries that cannot be read or do not fit the grammar are skipped.
use crate::config::LayoutConfig;
use crate::model::{NodeKind, TreeNode};
use crate::pattern::{AnomalyPattern, NameGrammar, TaskName};
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A matched subtree, captured with everything the planner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    TimestampFolder(TimestampFolderSnapshot),
    MisplacedArtifact(MisplacedArtifactSnapshot),
    FlatSampleIndex(FlatSampleSnapshot),
}

impl Anomaly {
    /// Path identifying the matched subtree.
    pub fn anchor(&self) -> &Path {
        match self {
            Anomaly::TimestampFolder(snapshot) => &snapshot.folder.path,
            Anomaly::MisplacedArtifact(snapshot) => &snapshot.artifact.path,
            Anomaly::FlatSampleIndex(snapshot) => &snapshot.task_folder.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFolderSnapshot {
    pub folder: TreeNode,
    /// Artifact files directly inside the folder, sorted by name.
    pub artifacts: Vec<TreeNode>,
    /// `<parent>/<canonical>` when it already exists.
    pub existing: Option<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirSnapshot {
    pub dir: TreeNode,
    /// Designated output subfolder, when it exists as a directory.
    pub placeholder: Option<TreeNode>,
    /// Artifact already inside the placeholder.
    pub existing: Option<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisplacedArtifactSnapshot {
    pub artifact: TreeNode,
    /// Sibling run directories, sorted by name; never empty.
    pub run_dirs: Vec<RunDirSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFolder {
    pub index: u64,
    pub node: TreeNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatSampleSnapshot {
    pub task_folder: TreeNode,
    pub name: TaskName,
    /// Numeric child folders, sorted by index then name.
    pub samples: Vec<SampleFolder>,
    /// Numeric child folders whose index does not fit in a `u64`.
    pub unindexed: Vec<TreeNode>,
    /// `<task>/<label>/` when it already exists.
    pub nested: Option<TreeNode>,
    /// Entry names already present inside `nested`.
    pub nested_entries: Vec<String>,
}

/// Pattern-agnostic walker over one root directory.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    config: LayoutConfig,
    grammar: NameGrammar,
}

impl Scanner {
    /// Bind a scanner to `root`; fails when the root is missing.
    pub fn new(root: &Path, config: &LayoutConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!("base directory does not exist: {}", root.display()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            config: config.clone(),
            grammar: NameGrammar::new(config)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield every subtree matching `pattern`.
    ///
    /// Each call starts a fresh walk, so scanning again after a run reflects
    /// the mutated tree.
    pub fn scan(&self, pattern: AnomalyPattern) -> ScanIter<'_> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(pattern.max_depth())
            .sort_by_file_name()
            .into_iter();
        ScanIter {
            scanner: self,
            pattern,
            walker,
        }
    }

    fn capture(&self, pattern: AnomalyPattern, path: &Path) -> Option<Anomaly> {
        match pattern {
            AnomalyPattern::TimestampFolder => self
                .capture_timestamp_folder(path)
                .map(Anomaly::TimestampFolder),
            AnomalyPattern::MisplacedArtifact => self
                .capture_misplaced_artifact(path)
                .map(Anomaly::MisplacedArtifact),
            AnomalyPattern::FlatSampleIndex => {
                self.capture_flat_samples(path).map(Anomaly::FlatSampleIndex)
            }
        }
    }

    fn capture_timestamp_folder(&self, path: &Path) -> Option<TimestampFolderSnapshot> {
        let folder = TreeNode::capture_if(path, NodeKind::Dir)?;
        let parent = path.parent()?;
        let artifacts = list_children(path)
            .into_iter()
            .filter(|child| self.config.is_artifact(child))
            .filter_map(|child| TreeNode::capture_if(&child, NodeKind::File))
            .collect();
        let existing =
            TreeNode::capture_if(&parent.join(&self.config.canonical_artifact), NodeKind::File);
        Some(TimestampFolderSnapshot {
            folder,
            artifacts,
            existing,
        })
    }

    fn capture_misplaced_artifact(&self, path: &Path) -> Option<MisplacedArtifactSnapshot> {
        let artifact = TreeNode::capture_if(path, NodeKind::File)?;
        let parent = path.parent()?;
        let run_dirs: Vec<RunDirSnapshot> = list_children(parent)
            .into_iter()
            .filter(|child| {
                child
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| self.grammar.is_run_dir(name))
            })
            .filter_map(|child| TreeNode::capture_if(&child, NodeKind::Dir))
            .map(|dir| {
                let placeholder_path = dir.path.join(&self.config.placeholder_dir);
                let placeholder = TreeNode::capture_if(&placeholder_path, NodeKind::Dir);
                let existing = placeholder.as_ref().and_then(|_| {
                    TreeNode::capture_if(
                        &placeholder_path.join(&self.config.canonical_artifact),
                        NodeKind::File,
                    )
                });
                RunDirSnapshot {
                    dir,
                    placeholder,
                    existing,
                }
            })
            .collect();
        if run_dirs.is_empty() {
            return None;
        }
        Some(MisplacedArtifactSnapshot { artifact, run_dirs })
    }

    fn capture_flat_samples(&self, path: &Path) -> Option<FlatSampleSnapshot> {
        let task_folder = TreeNode::capture_if(path, NodeKind::Dir)?;
        let name = self.grammar.parse_task_folder(task_folder.name())?;
        tracing::debug!(
            series = %name.series,
            task = %name.task,
            label = %name.label,
            "task folder"
        );
        let mut samples = Vec::new();
        let mut unindexed = Vec::new();
        for child in list_children(path) {
            let Some(name) = child.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !self.grammar.is_sample_name(name) {
                continue;
            }
            let Some(node) = TreeNode::capture_if(&child, NodeKind::Dir) else {
                continue;
            };
            match self.grammar.parse_sample_index(name) {
                Some(index) => samples.push(SampleFolder { index, node }),
                None => unindexed.push(node),
            }
        }
        samples.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.node.path.cmp(&b.node.path)));
        let nested_path = path.join(&name.label);
        let nested = TreeNode::capture_if(&nested_path, NodeKind::Dir);
        let nested_entries = if nested.is_some() {
            list_children(&nested_path)
                .into_iter()
                .filter_map(|child| {
                    child
                        .file_name()
                        .and_then(|name| name.to_str())
                        .map(str::to_string)
                })
                .collect()
        } else {
            Vec::new()
        };
        Some(FlatSampleSnapshot {
            task_folder,
            name,
            samples,
            unindexed,
            nested,
            nested_entries,
        })
    }
}

/// Iterator returned by [`Scanner::scan`].
pub struct ScanIter<'a> {
    scanner: &'a Scanner,
    pattern: AnomalyPattern,
    walker: walkdir::IntoIter,
}

impl Iterator for ScanIter<'_> {
    type Item = Anomaly;

    fn next(&mut self) -> Option<Anomaly> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skip unreadable entry");
                    continue;
                }
            };
            let is_dir = entry.file_type().is_dir();
            if !self
                .pattern
                .matches(&self.scanner.grammar, entry.path(), is_dir)
            {
                continue;
            }
            if is_dir && self.pattern.prunes_match() {
                self.walker.skip_current_dir();
            }
            match self.scanner.capture(self.pattern, entry.path()) {
                Some(anomaly) => return Some(anomaly),
                None => {
                    tracing::debug!(path = %entry.path().display(), "entry does not fit pattern");
                }
            }
        }
    }
}

/// Direct children of `dir` sorted by name; unreadable directories yield none.
fn list_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children
}
