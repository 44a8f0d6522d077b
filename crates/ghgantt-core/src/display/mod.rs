//! Markdown formatting of plans, reports and summaries.
//!
//! Domain types implement [`std::fmt::Display`] where there is one obvious
//! rendering (a [`FieldChange`](crate::reconcile::FieldChange) reads
//! `labels: a → a, b`). Everything that needs context is a newtype wrapper
//! here, so the same plan can be shown as a change list or counted in a
//! summary. All output is markdown; the CLI renders it for the terminal.
//!
//! ```rust
//! use ghgantt_core::display::{ChangeList, OperationStatus};
//! use ghgantt_core::reconcile::MutationPlan;
//!
//! let plan = MutationPlan::default();
//! assert!(ChangeList(&plan).to_string().starts_with("No changes."));
//!
//! let status = OperationStatus::success("Wrote config.yaml");
//! assert_eq!(status.to_string(), "**OK** Wrote config.yaml\n");
//! ```

pub mod changes;
pub mod results;
pub mod status;
pub mod summary;

pub use changes::{ChangeList, Diagnostics};
pub use results::{PullResult, PushResult, ValidationReport};
pub use status::OperationStatus;
pub use summary::{AccessSummary, ProjectSummary};
