//! Data models for tasks and projects.
//!
//! A [`Project`] holds the [`ProjectMeta`] of the tracked GitHub Project and a
//! forest of [`Task`]s. Nesting encodes the sub-issue hierarchy. The same
//! shape is produced by every source: the YAML and spreadsheet adapters in
//! [`crate::formats`] and the remote snapshot built by [`crate::gateway`].
//!
//! # Provenance
//!
//! Attributes the user edits (title, dates, assignees, labels, closed state,
//! body) are plain fields. Attributes owned by the system (milestone and
//! progress) are wrapped in [`Derived`], and [`TaskField::provenance`]
//! decides which attributes the reconciliation engine compares.
//!
//! # Identity
//!
//! Two tasks refer to the same issue when their [`RemoteId`]s match and are
//! not the sentinel [`RemoteId::NEW`].
//!
//! ```rust
//! use ghgantt_core::models::{Project, ProjectMeta, RemoteId, Task};
//!
//! let mut parent = Task::existing(1, "Backend");
//! parent.subtasks.push(Task::new("Design API"));
//!
//! let project = Project::new(ProjectMeta::default(), vec![parent]);
//! assert_eq!(project.total_tasks(), 2);
//! assert!(project.find(RemoteId(1)).is_some());
//! assert!(project.find(RemoteId::NEW).is_none());
//! ```

pub mod field;
pub mod filters;
pub mod project;
pub mod status;
pub mod task;


pub use field::{Derived, Provenance, TaskField};
pub use filters::FetchFilter;
pub use project::{Project, ProjectMeta};
pub use status::{DateField, VisualState};
pub use task::{outline, task_at, task_at_mut, walk, RemoteId, Task, TaskEntry, TaskPath, Walk};
