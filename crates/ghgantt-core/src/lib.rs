//! Core library of ghgantt: GitHub issues as an editable Gantt plan.
//!
//! The crate keeps a local working file (YAML or xlsx) and the issues of a
//! GitHub Project in step:
//!
//! - **Pull** fetches the Project through a [`RemoteGateway`], recomputes
//!   progress and writes the working file, its other encoding, a Mermaid
//!   chart and one markdown file per issue body.
//! - **Push** parses and validates the working file, diffs it against a fresh
//!   remote snapshot ([`reconcile::plan`]) and applies the resulting
//!   operations one by one ([`reconcile::execute`]). Identifiers of created
//!   issues are written back into the working file.
//!
//! # Layout
//!
//! - [`models`]: the task tree, field provenance and visual states
//! - [`formats`]: YAML, spreadsheet and body file adapters
//! - [`validation`]: aggregated checks shared by both adapters
//! - [`progress`]: bottom-up completion percentages
//! - [`reconcile`]: mutation planning and execution
//! - [`gantt`]: schedule projection with Mermaid and table renderers
//! - [`gateway`]: the remote capability boundary (GitHub and in-memory)
//! - [`display`]: markdown wrappers for plans and reports
//! - [`sync`]: the async [`Synchronizer`] facade
//!
//! # Quick Start
//!
//! ```rust
//! use ghgantt_core::gateway::InMemoryGateway;
//! use ghgantt_core::models::{Project, ProjectMeta, Task};
//! use ghgantt_core::reconcile::{execute, plan, ReconcileOptions};
//!
//! let mut local = Project::new(ProjectMeta::default(), vec![Task::new("Design API")]);
//! let mut remote = InMemoryGateway::new(ProjectMeta::default());
//!
//! let mutation_plan = plan(&local, &remote.snapshot(), ReconcileOptions::default());
//! assert_eq!(mutation_plan.count("Create"), 1);
//!
//! let report = execute(mutation_plan, &mut local, &mut remote);
//! assert!(report.is_success());
//! assert!(!local.tasks[0].is_new());
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod formats;
pub mod gantt;
pub mod gateway;
pub mod models;
pub mod params;
pub mod progress;
pub mod reconcile;
pub mod sync;
pub mod validation;

// Re-export commonly used types
pub use config::{Artifacts, Config};
pub use display::{ChangeList, OperationStatus, ProjectSummary, PullResult, PushResult};
pub use error::{RemoteError, Result, SyncError};
pub use gateway::{GithubGateway, InMemoryGateway, RemoteGateway};
pub use models::{Project, ProjectMeta, RemoteId, Task};
pub use params::{InitParams, PushParams, ValidateParams, ViewFormat, ViewParams};
pub use reconcile::{ExecutionReport, MutationPlan};
pub use sync::{PullOutcome, PushOutcome, Synchronizer, SynchronizerBuilder, ValidateOutcome};
pub use validation::ValidationErrors;
