//! Command-line arguments.
//!
//! Each subcommand has a clap struct that converts into the matching core
//! parameter type with `From`, so the core stays free of clap:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Synchronizer
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ghgantt_core::params::{InitParams, PushParams, ValidateParams, ViewFormat, ViewParams};

/// Manage GitHub issues as Gantt chart tasks
///
/// Pull a GitHub Project into a YAML or xlsx working file, edit schedules,
/// hierarchy and issue fields locally, and push the changes back.
#[derive(Parser)]
#[command(version, about, name = "ghgantt")]
pub struct Args {
    /// Path to config.yaml. Defaults to the nearest one in the current
    /// directory or its parents
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub token used for pull, push, status and remote validation
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub API root, for Enterprise installations
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config.yaml for a repository and Project
    Init(InitArgs),

    /// Fetch the Project and write the working file, chart and issue bodies
    Pull,

    /// Apply local edits to GitHub
    Push(PushArgs),

    /// Show what a push would change
    #[command(alias = "diff")]
    Status,

    /// Render the working file as a chart or table
    View(ViewArgs),

    /// Check the working file, and optionally Project access
    Validate(ValidateArgs),
}

/// Write a config.yaml
#[derive(clap::Args)]
pub struct InitArgs {
    /// Repository as owner/name
    pub repo: String,

    /// Number of the GitHub Project
    pub project_number: u64,

    /// Directory that receives config.yaml
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Working file name (.yaml, .yml or .xlsx)
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Name of the Project's start date field
    #[arg(long)]
    pub start_field: Option<String>,

    /// Name of the Project's end date field
    #[arg(long)]
    pub end_field: Option<String>,

    /// Replace an existing config.yaml
    #[arg(short, long)]
    pub force: bool,
}

impl From<InitArgs> for InitParams {
    fn from(val: InitArgs) -> Self {
        InitParams {
            directory: val.dir,
            repo: val.repo,
            project_number: val.project_number,
            output_file: val.output_file,
            start_field: val.start_field,
            end_field: val.end_field,
            force: val.force,
        }
    }
}

/// Apply local edits to GitHub
#[derive(clap::Args)]
pub struct PushArgs {
    /// Show the plan without applying it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Re-link sub-issues so GitHub matches the local nesting
    #[arg(long)]
    pub enforce_hierarchy: bool,
}

impl From<PushArgs> for PushParams {
    fn from(val: PushArgs) -> Self {
        PushParams {
            dry_run: val.dry_run,
            enforce_hierarchy: val.enforce_hierarchy,
        }
    }
}

/// Render the working file
#[derive(clap::Args)]
pub struct ViewArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ViewFormatArg::Mermaid)]
    pub format: ViewFormatArg,

    /// Also save the rendering to this markdown file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Count weekends as working days and show them on the chart
    #[arg(long)]
    pub include_weekends: bool,
}

impl From<ViewArgs> for ViewParams {
    fn from(val: ViewArgs) -> Self {
        ViewParams {
            format: val.format.into(),
            exclude_weekends: !val.include_weekends,
            output: val.output,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ViewFormatArg {
    /// Mermaid chart grouped by milestone
    Mermaid,
    /// Mermaid chart with one section per root task
    Hierarchy,
    /// Mermaid chart with a single section
    Flat,
    /// Markdown table
    Table,
}

impl From<ViewFormatArg> for ViewFormat {
    fn from(val: ViewFormatArg) -> Self {
        match val {
            ViewFormatArg::Mermaid => ViewFormat::Mermaid,
            ViewFormatArg::Hierarchy => ViewFormat::Hierarchy,
            ViewFormatArg::Flat => ViewFormat::Flat,
            ViewFormatArg::Table => ViewFormat::Table,
        }
    }
}

/// Check the working file
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Also check that the Project and its date fields are reachable
    #[arg(long)]
    pub remote: bool,
}

impl From<ValidateArgs> for ValidateParams {
    fn from(val: ValidateArgs) -> Self {
        ValidateParams { remote: val.remote }
    }
}
