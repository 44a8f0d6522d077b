//! Capability boundary for remote issue and Project state.
//!
//! The reconciliation engine only talks to a [`RemoteGateway`]. The GitHub
//! implementation ([`GithubGateway`]) combines the GraphQL API (Project items
//! and date fields, sub-issue links) with the REST API (issue create and
//! edit). [`InMemoryGateway`] keeps the same contract over a local snapshot
//! and records every call, which is what the engine is tested against.
//!
//! Every call fails with a [`RemoteError`]. Transport failures affect the
//! whole run; every other kind is local to the one operation. Rate limits
//! carry the retry hint the remote sent, but nothing here retries.

mod github;
mod memory;

use std::collections::{BTreeSet, HashMap};

use jiff::civil::Date;

pub use github::GithubGateway;
pub use memory::{GatewayCall, InMemoryGateway};

pub use crate::error::RemoteError;
use crate::models::{DateField, FetchFilter, Project, RemoteId, Task};

/// Content of an issue to create.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
}

/// Identifiers the remote assigned to a new issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub remote_id: RemoteId,
    pub node_id: String,
    pub url: String,
}

/// Partial issue update; `None` leaves the attribute untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub assignees: Option<BTreeSet<String>>,
    pub labels: Option<BTreeSet<String>>,
    pub closed: Option<bool>,
}

impl IssueUpdate {
    /// An update that only changes the open/closed state.
    pub fn state(closed: bool) -> Self {
        Self {
            closed: Some(closed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.assignees.is_none()
            && self.labels.is_none()
            && self.closed.is_none()
    }
}

/// Result of probing the configured Project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub project_title: String,
    pub project_url: String,
    pub start_field: Option<String>,
    pub end_field: Option<String>,
}

impl AccessReport {
    /// Names of the configured date fields the Project lacks.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.start_field.is_none() {
            missing.push("start");
        }
        if self.end_field.is_none() {
            missing.push("end");
        }
        missing
    }
}

/// Remote operations the engine depends on.
///
/// Calls are blocking and made one at a time; implementations may keep
/// caches (node ids, item ids) between calls of one run.
pub trait RemoteGateway {
    /// Reads the Project and builds the task tree from sub-issue links.
    fn fetch_project(&mut self, filter: &FetchFilter) -> Result<Project, RemoteError>;

    fn create_issue(&mut self, draft: &IssueDraft) -> Result<CreatedIssue, RemoteError>;

    fn update_issue(&mut self, remote_id: RemoteId, update: &IssueUpdate)
        -> Result<(), RemoteError>;

    /// Sets or clears a Project date field of the issue's item.
    fn set_date_field(
        &mut self,
        remote_id: RemoteId,
        field: DateField,
        value: Option<Date>,
    ) -> Result<(), RemoteError>;

    /// Makes `child` a sub-issue of `parent`, replacing any previous parent.
    fn link_parent_child(&mut self, parent: RemoteId, child: RemoteId) -> Result<(), RemoteError>;

    /// Adds the issue to the Project and returns the item id.
    fn add_to_project(&mut self, remote_id: RemoteId) -> Result<String, RemoteError>;

    /// Confirms the Project is reachable and reports its date fields.
    fn check_access(&mut self) -> Result<AccessReport, RemoteError>;
}

/// Builds a forest from flat tasks carrying `parent` pointers.
///
/// Item order is kept among siblings. A task whose parent is not among the
/// items becomes a root but keeps its `parent` value, so hierarchy checks
/// still see the remote linkage.
pub fn assemble(items: Vec<Task>) -> Vec<Task> {
    let index: HashMap<RemoteId, usize> = items
        .iter()
        .enumerate()
        .filter(|(_, task)| !task.is_new())
        .map(|(position, task)| (task.remote_id, position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();
    for (position, task) in items.iter().enumerate() {
        match task.parent.and_then(|parent| index.get(&parent)) {
            Some(&parent) if parent != position => children[parent].push(position),
            _ => roots.push(position),
        }
    }

    let mut slots: Vec<Option<Task>> = items.into_iter().map(Some).collect();
    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        if let Some(task) = build(root, &mut slots, &children) {
            forest.push(task);
        }
    }
    // Items caught in a parent cycle are unreachable from any root.
    for slot in slots.iter_mut() {
        if let Some(task) = slot.take() {
            log::warn!("{} is part of a parent cycle; listed as a root", task.reference());
            forest.push(task);
        }
    }
    forest
}

fn build(position: usize, slots: &mut [Option<Task>], children: &[Vec<usize>]) -> Option<Task> {
    let mut task = slots[position].take()?;
    for &child in &children[position] {
        if let Some(subtask) = build(child, slots, children) {
            task.subtasks.push(subtask);
        }
    }
    Some(task)
}
