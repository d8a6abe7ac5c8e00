//! Layout configuration shared by the scanner, planner, and executor.
//!
//! Every name the normalizer matches or produces comes from here, so a run is
//! fully described by its root, its pattern, and one `LayoutConfig`.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Generator suffixes stripped from task names, tried in order.
pub const DEFAULT_GENERATOR_SUFFIXES: [&str; 4] = [
    "_data-generator",
    "-data-generator",
    "_data_generator",
    "_generator",
];

/// Immutable naming rules for one normalization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Prefix of timestamp folders written by the job runner (`<label>_<token>`).
    pub job_label: String,
    /// Extension identifying artifact files, without the dot.
    pub artifact_extension: String,
    /// File name every artifact converges to.
    pub canonical_artifact: String,
    /// Output subfolder inside a run directory that receives the artifact.
    pub placeholder_dir: String,
    /// Substring marking a directory as a run directory.
    pub run_dir_marker: String,
    /// Suffixes stripped from task names to derive the sample label.
    pub generator_suffixes: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            job_label: "hunyuan".to_string(),
            artifact_extension: "mp4".to_string(),
            canonical_artifact: "video.mp4".to_string(),
            placeholder_dir: "video".to_string(),
            run_dir_marker: "_".to_string(),
            generator_suffixes: DEFAULT_GENERATOR_SUFFIXES
                .iter()
                .map(|suffix| suffix.to_string())
                .collect(),
        }
    }
}

impl LayoutConfig {
    /// Whether `path` names an artifact file by extension.
    pub fn is_artifact(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.artifact_extension))
    }
}

/// Load the layout config, falling back to defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let bytes = fs::read(path).with_context(|| format!("read layout config {}", path.display()))?;
    let config: LayoutConfig =
        serde_json::from_slice(&bytes).context("parse layout config JSON")?;
    validate_config(&config).with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

/// Reject configs that would produce ambiguous or path-escaping names.
pub fn validate_config(config: &LayoutConfig) -> Result<()> {
    let names = [
        ("job_label", &config.job_label),
        ("artifact_extension", &config.artifact_extension),
        ("canonical_artifact", &config.canonical_artifact),
        ("placeholder_dir", &config.placeholder_dir),
        ("run_dir_marker", &config.run_dir_marker),
    ];
    for (field, value) in names {
        if value.trim().is_empty() {
            return Err(anyhow!("{field} must not be empty"));
        }
        if value.contains('/') || value.contains('\\') {
            return Err(anyhow!("{field} must not contain path separators: {value}"));
        }
    }
    if config.artifact_extension.starts_with('.') {
        return Err(anyhow!(
            "artifact_extension must not start with a dot: {}",
            config.artifact_extension
        ));
    }
    if !config.is_artifact(Path::new(&config.canonical_artifact)) {
        return Err(anyhow!(
            "canonical_artifact {} does not carry extension .{}",
            config.canonical_artifact,
            config.artifact_extension
        ));
    }
    for suffix in &config.generator_suffixes {
        if suffix.is_empty() {
            return Err(anyhow!("generator_suffixes entries must not be empty"));
        }
    }
    Ok(())
}
