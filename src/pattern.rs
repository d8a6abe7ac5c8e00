//! Anomaly patterns and the naming grammar they match against.
//!
//! Each pattern owns its structural predicate so the scanner can walk a tree
//! without knowing which layout it is looking for.
use crate::config::LayoutConfig;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Sample indices at or above this render with five digits.
pub const WIDE_INDEX_THRESHOLD: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPattern {
    /// `<job-label>_<token>/` folder holding the artifact one level too deep.
    TimestampFolder,
    /// Artifact sitting beside run directories instead of inside one.
    MisplacedArtifact,
    /// Numeric sample folders directly under a task folder.
    FlatSampleIndex,
}

impl AnomalyPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyPattern::TimestampFolder => "timestamp_folder",
            AnomalyPattern::MisplacedArtifact => "misplaced_artifact",
            AnomalyPattern::FlatSampleIndex => "flat_sample_index",
        }
    }

    /// Deepest level the scanner visits, relative to the root.
    pub fn max_depth(self) -> usize {
        match self {
            AnomalyPattern::FlatSampleIndex => 1,
            AnomalyPattern::TimestampFolder | AnomalyPattern::MisplacedArtifact => usize::MAX,
        }
    }

    /// Whether the scanner should stop descending once a directory matches.
    pub fn prunes_match(self) -> bool {
        matches!(self, AnomalyPattern::TimestampFolder)
    }

    /// Structural predicate over a single entry (name and kind only).
    pub fn matches(self, grammar: &NameGrammar, path: &Path, is_dir: bool) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        match self {
            AnomalyPattern::TimestampFolder => is_dir && grammar.is_timestamp_folder(name),
            AnomalyPattern::MisplacedArtifact => !is_dir && name == grammar.canonical_artifact(),
            AnomalyPattern::FlatSampleIndex => is_dir && grammar.parse_task_folder(name).is_some(),
        }
    }

    /// Short description of the canonical layout this pattern converges to.
    pub fn target_layout(self, config: &LayoutConfig) -> String {
        match self {
            AnomalyPattern::TimestampFolder => format!("<parent>/{}", config.canonical_artifact),
            AnomalyPattern::MisplacedArtifact => format!(
                "<newest run>/{}/{}",
                config.placeholder_dir, config.canonical_artifact
            ),
            AnomalyPattern::FlatSampleIndex => "<task>/<label>/<label>_<index>".to_string(),
        }
    }
}

impl fmt::Display for AnomalyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `<Series>-<number>_<rest>` task folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskName {
    /// Series and number, e.g. `G-12`.
    pub series: String,
    /// Everything after the first underscore.
    pub task: String,
    /// `task` with one generator suffix stripped.
    pub label: String,
}

/// Compiled name rules for one layout config.
#[derive(Debug, Clone)]
pub struct NameGrammar {
    timestamp_folder: Regex,
    task_folder: Regex,
    sample_index: Regex,
    canonical_artifact: String,
    run_dir_marker: String,
    generator_suffixes: Vec<String>,
}

impl NameGrammar {
    pub fn new(config: &LayoutConfig) -> Result<Self> {
        let timestamp_folder = Regex::new(&format!("^{}_.+$", regex::escape(&config.job_label)))
            .context("compile timestamp folder pattern")?;
        let task_folder =
            Regex::new(r"^([A-Z]-\d+)_(.+)$").context("compile task folder pattern")?;
        let sample_index = Regex::new(r"^\d+$").context("compile sample index pattern")?;
        Ok(Self {
            timestamp_folder,
            task_folder,
            sample_index,
            canonical_artifact: config.canonical_artifact.clone(),
            run_dir_marker: config.run_dir_marker.clone(),
            generator_suffixes: config.generator_suffixes.clone(),
        })
    }

    pub fn canonical_artifact(&self) -> &str {
        &self.canonical_artifact
    }

    pub fn is_timestamp_folder(&self, name: &str) -> bool {
        self.timestamp_folder.is_match(name)
    }

    pub fn is_run_dir(&self, name: &str) -> bool {
        name.contains(self.run_dir_marker.as_str())
    }

    /// Whether `name` is all digits, whatever its magnitude.
    pub fn is_sample_name(&self, name: &str) -> bool {
        self.sample_index.is_match(name)
    }

    /// Parse a pure non-negative integer folder name; `None` when it does not
    /// fit in a `u64`.
    pub fn parse_sample_index(&self, name: &str) -> Option<u64> {
        if !self.is_sample_name(name) {
            return None;
        }
        name.parse().ok()
    }

    pub fn parse_task_folder(&self, name: &str) -> Option<TaskName> {
        let caps = self.task_folder.captures(name)?;
        let series = caps.get(1)?.as_str().to_string();
        let task = caps.get(2)?.as_str().to_string();
        let label = strip_generator_suffix(&task, &self.generator_suffixes).to_string();
        if label.is_empty() {
            return None;
        }
        Some(TaskName {
            series,
            task,
            label,
        })
    }
}

/// Strip the first suffix in `suffixes` that `task` ends with.
pub fn strip_generator_suffix<'a>(task: &'a str, suffixes: &[String]) -> &'a str {
    suffixes
        .iter()
        .find_map(|suffix| task.strip_suffix(suffix.as_str()))
        .unwrap_or(task)
}

/// Render the canonical folder name for one sample.
pub fn sample_name(label: &str, index: u64) -> String {
    if index < WIDE_INDEX_THRESHOLD {
        format!("{label}_{index:04}")
    } else {
        format!("{label}_{index:05}")
    }
}
