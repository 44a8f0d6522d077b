//! Reconciliation of a local task tree against a remote snapshot.
//!
//! [`plan`] pairs local and remote tasks by [`RemoteId`] and produces a
//! [`MutationPlan`]: an ordered list of [`Operation`]s plus informational
//! [`Diagnostic`]s. [`execute`] applies the operations one at a time through a
//! [`RemoteGateway`](crate::gateway::RemoteGateway), writing newly assigned
//! identifiers back into the local tree as it goes.
//!
//! ```text
//! local tree ──┐
//!              ├──▶ plan() ──▶ MutationPlan ──▶ execute() ──▶ ExecutionReport
//! remote tree ─┘                                   │
//!                                                  └──▶ local tree with new ids
//! ```
//!
//! Conflicts are resolved in favour of the local value: when a field differs,
//! the operation rewrites the remote to match the working file. There is no
//! three-way merge against the state of the last pull.
//!
//! Operations are emitted in pre-order, so a parent's `Create` always comes
//! before anything that needs the parent's new identifier. Operations refer
//! to their task by tree path; the executor resolves the current identifier
//! at the moment each operation runs.

mod executor;
mod plan;

use std::collections::BTreeSet;
use std::fmt;

use jiff::civil::Date;

pub use executor::{execute, ExecutionReport, OperationError, OperationOutcome};
pub use plan::plan;

use crate::gateway::{IssueDraft, IssueUpdate};
use crate::models::{outline, DateField, RemoteId, Task, TaskField, TaskPath};

/// Switches that change what the planner emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Emit `LinkParent` when remote parent links disagree with the nesting
    /// of the working file. Otherwise mismatches are only reported.
    pub enforce_hierarchy: bool,
}

/// A task addressed by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    /// Position in the local tree
    pub path: TaskPath,

    /// Identifier when the operation was planned (or once it was created)
    pub remote_id: RemoteId,

    pub title: String,
}

impl TaskRef {
    pub fn new(path: TaskPath, task: &Task) -> Self {
        Self {
            path,
            remote_id: task.remote_id,
            title: task.title.clone(),
        }
    }

    pub fn outline(&self) -> String {
        outline(&self.path)
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.remote_id, self.title)
    }
}

/// A difference on an issue attribute. `from` is the remote value, `to` the
/// local one that will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Title { from: String, to: String },
    Body { from: String, to: String },
    Assignees { from: BTreeSet<String>, to: BTreeSet<String> },
    Labels { from: BTreeSet<String>, to: BTreeSet<String> },
    Closed { from: bool, to: bool },
}

impl FieldChange {
    pub fn field(&self) -> TaskField {
        match self {
            FieldChange::Title { .. } => TaskField::Title,
            FieldChange::Body { .. } => TaskField::Body,
            FieldChange::Assignees { .. } => TaskField::Assignees,
            FieldChange::Labels { .. } => TaskField::Labels,
            FieldChange::Closed { .. } => TaskField::Closed,
        }
    }

    /// Copies the target value into a partial issue update.
    pub fn apply_to(&self, update: &mut IssueUpdate) {
        match self {
            FieldChange::Title { to, .. } => update.title = Some(to.clone()),
            FieldChange::Body { to, .. } => update.body = Some(to.clone()),
            FieldChange::Assignees { to, .. } => update.assignees = Some(to.clone()),
            FieldChange::Labels { to, .. } => update.labels = Some(to.clone()),
            FieldChange::Closed { to, .. } => update.closed = Some(*to),
        }
    }
}

/// A difference on a Project date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateChange {
    pub field: DateField,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

/// What an operation does to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create the issue; `closed` closes it right after creation
    Create { draft: IssueDraft, closed: bool },

    UpdateFields(Vec<FieldChange>),

    UpdateDates(Vec<DateChange>),

    AddToProject,

    /// Make the target a sub-issue of `parent`
    LinkParent {
        parent: TaskRef,
        current: Option<RemoteId>,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "Create",
            Mutation::UpdateFields(_) => "UpdateFields",
            Mutation::UpdateDates(_) => "UpdateDates",
            Mutation::AddToProject => "AddToProject",
            Mutation::LinkParent { .. } => "LinkParent",
        }
    }
}

/// One step of a mutation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub target: TaskRef,
    pub mutation: Mutation,
}

/// Findings that do not turn into operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The working file names an issue the remote snapshot does not have.
    /// The task is left out of the plan.
    StaleReference { task: TaskRef },

    /// Remote parent link differs from the nesting in the working file
    HierarchyMismatch {
        task: TaskRef,
        local_parent: Option<RemoteId>,
        remote_parent: Option<RemoteId>,
    },
}

fn parent_label(parent: Option<RemoteId>) -> String {
    match parent {
        Some(id) => id.to_string(),
        None => "no parent".to_string(),
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::StaleReference { task } => write!(
                f,
                "{task}: issue not found in the project; skipped"
            ),
            Diagnostic::HierarchyMismatch {
                task,
                local_parent,
                remote_parent,
            } => write!(
                f,
                "{task}: nested under {} locally, under {} remotely",
                parent_label(*local_parent),
                parent_label(*remote_parent)
            ),
        }
    }
}

/// Ordered operations and diagnostics computed by [`plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    pub operations: Vec<Operation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MutationPlan {
    /// Whether executing the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Number of operations with the given name, e.g. `"Create"`.
    pub fn count(&self, name: &str) -> usize {
        self.operations
            .iter()
            .filter(|operation| operation.mutation.name() == name)
            .count()
    }

    /// Operations targeting the task at `path`, in plan order.
    pub fn for_path<'a>(&'a self, path: &'a [usize]) -> impl Iterator<Item = &'a Operation> {
        self.operations
            .iter()
            .filter(move |operation| operation.target.path == path)
    }
}
