//! CLI argument parsing for the normalization passes.
//!
//! Each subcommand selects one anomaly pattern; the shared options are
//! flattened so every pass accepts the same mode and output flags.
use crate::pattern::AnomalyPattern;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default output tree written by the video generation jobs.
pub const DEFAULT_BASE_DIR: &str = "data/outputs/hunyuan-video-i2v";

/// Default questions tree holding task-family folders.
pub const DEFAULT_QUESTIONS_DIR: &str = "data/questions";

/// Root CLI entrypoint for the normalizer.
#[derive(Parser, Debug)]
#[command(
    name = "anorm",
    version,
    about = "Normalize generated-output directory trees into a canonical layout",
    after_help = "Commands:\n  timestamp-folders --base-dir <dir>        Lift artifacts out of <label>_<token> folders\n  misplaced-artifacts --base-dir <dir>      Move stray artifacts into the newest run's placeholder\n  flat-samples --questions-dir <dir>        Nest numeric sample folders under a label folder\n\nExamples:\n  anorm timestamp-folders --base-dir data/outputs/hunyuan-video-i2v --dry-run\n  anorm misplaced-artifacts --base-dir data/outputs/hunyuan-video-i2v\n  anorm flat-samples --questions-dir data/questions --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Normalization passes, one per anomaly pattern.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lift artifacts out of <label>_<token> timestamp folders
    TimestampFolders(BaseDirArgs),
    /// Move stray artifacts into the newest run's placeholder folder
    MisplacedArtifacts(BaseDirArgs),
    /// Nest flat numeric sample folders under their task label
    FlatSamples(QuestionsDirArgs),
}

impl Command {
    pub fn pattern(&self) -> AnomalyPattern {
        match self {
            Command::TimestampFolders(_) => AnomalyPattern::TimestampFolder,
            Command::MisplacedArtifacts(_) => AnomalyPattern::MisplacedArtifact,
            Command::FlatSamples(_) => AnomalyPattern::FlatSampleIndex,
        }
    }

    pub fn root(&self) -> &PathBuf {
        match self {
            Command::TimestampFolders(args) | Command::MisplacedArtifacts(args) => &args.base_dir,
            Command::FlatSamples(args) => &args.questions_dir,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::TimestampFolders(args) | Command::MisplacedArtifacts(args) => &args.common,
            Command::FlatSamples(args) => &args.common,
        }
    }
}

/// Inputs for passes that scan a generated-output tree.
#[derive(Parser, Debug)]
pub struct BaseDirArgs {
    /// Output tree to scan
    #[arg(long, value_name = "DIR", default_value = DEFAULT_BASE_DIR)]
    pub base_dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Inputs for the sample restructuring pass.
#[derive(Parser, Debug)]
pub struct QuestionsDirArgs {
    /// Questions directory holding <Series>-<n>_<label> task folders
    #[arg(long, value_name = "DIR", default_value = DEFAULT_QUESTIONS_DIR)]
    pub questions_dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every pass.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the execution report as JSON instead of the text trace
    #[arg(long)]
    pub json: bool,

    /// Layout config JSON overriding names and suffixes
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub verbose: bool,
}
