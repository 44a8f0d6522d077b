//! Parameter structures for synchronizer operations.
//!
//! These are plain structures without framework derives beyond serde, so the
//! CLI can wrap them in its own clap argument types and convert with
//! `From`:
//!
//! ```text
//! CLI Args (clap) ──From──▶ Core Params ──▶ Synchronizer
//! ```
//!
//! ```ignore
//! #[derive(clap::Args)]
//! pub struct PushArgs {
//!     #[arg(short = 'n', long)]
//!     pub dry_run: bool,
//! }
//!
//! impl From<PushArgs> for PushParams {
//!     fn from(args: PushArgs) -> Self {
//!         PushParams { dry_run: args.dry_run, ..Default::default() }
//!     }
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gantt::GroupBy;
use crate::reconcile::ReconcileOptions;

/// Parameters for writing a fresh configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitParams {
    /// Directory that receives `config.yaml`
    pub directory: PathBuf,

    /// Repository as `owner/name`
    pub repo: String,

    pub project_number: u64,

    /// Working file name; the configuration default when absent
    pub output_file: Option<String>,

    /// Name of the Project's start date field, when not the default
    pub start_field: Option<String>,

    /// Name of the Project's end date field, when not the default
    pub end_field: Option<String>,

    /// Replace an existing configuration file
    #[serde(default)]
    pub force: bool,
}

/// Parameters for pushing the working file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PushParams {
    /// Compute and return the plan without executing it
    #[serde(default)]
    pub dry_run: bool,

    /// Re-link sub-issues so the remote matches the local nesting
    #[serde(default)]
    pub enforce_hierarchy: bool,
}

impl PushParams {
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            enforce_hierarchy: self.enforce_hierarchy,
        }
    }
}

/// Output of the view command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
    /// Mermaid chart grouped by milestone
    #[default]
    Mermaid,

    /// Mermaid chart with one section per root task
    Hierarchy,

    /// Mermaid chart with a single section
    Flat,

    /// Markdown table of every task
    Table,
}

impl ViewFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewFormat::Mermaid => "mermaid",
            ViewFormat::Hierarchy => "hierarchy",
            ViewFormat::Flat => "flat",
            ViewFormat::Table => "table",
        }
    }

    /// Chart grouping, or `None` for the table.
    pub fn group_by(&self) -> Option<GroupBy> {
        match self {
            ViewFormat::Mermaid => Some(GroupBy::Milestone),
            ViewFormat::Hierarchy => Some(GroupBy::Hierarchy),
            ViewFormat::Flat => Some(GroupBy::Flat),
            ViewFormat::Table => None,
        }
    }
}

impl FromStr for ViewFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mermaid" | "milestone" => Ok(ViewFormat::Mermaid),
            "hierarchy" => Ok(ViewFormat::Hierarchy),
            "flat" => Ok(ViewFormat::Flat),
            "table" => Ok(ViewFormat::Table),
            _ => Err(format!("Invalid view format: {s}")),
        }
    }
}

impl fmt::Display for ViewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for rendering the working file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub format: ViewFormat,

    /// Count working days and hide weekends on the chart
    pub exclude_weekends: bool,

    /// Also save the rendering as a markdown document
    pub output: Option<PathBuf>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            format: ViewFormat::Mermaid,
            exclude_weekends: true,
            output: None,
        }
    }
}

/// Parameters for validating the working file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidateParams {
    /// Also check that the Project and its date fields are reachable
    #[serde(default)]
    pub remote: bool,
}
