//! In-memory remote used for offline runs and tests.

use std::collections::BTreeSet;

use jiff::civil::Date;

use super::{assemble, AccessReport, CreatedIssue, IssueDraft, IssueUpdate, RemoteGateway};
use crate::error::RemoteError;
use crate::models::{walk, DateField, FetchFilter, Project, ProjectMeta, RemoteId, Task};

/// A call received by [`InMemoryGateway`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Fetch,
    Create {
        title: String,
    },
    Update {
        remote_id: RemoteId,
        update: IssueUpdate,
    },
    SetDate {
        remote_id: RemoteId,
        field: DateField,
        value: Option<Date>,
    },
    Link {
        parent: RemoteId,
        child: RemoteId,
    },
    AddToProject {
        remote_id: RemoteId,
    },
    CheckAccess,
}

type CallMatcher = Box<dyn Fn(&GatewayCall) -> bool + Send>;

/// A remote held in memory: a flat list of issues with parent pointers and
/// the set of issues that are Project items.
pub struct InMemoryGateway {
    meta: ProjectMeta,
    issues: Vec<Task>,
    in_project: BTreeSet<RemoteId>,
    next_number: u64,
    failures: Vec<(CallMatcher, RemoteError)>,
    calls: Vec<GatewayCall>,
}

impl InMemoryGateway {
    pub fn new(meta: ProjectMeta) -> Self {
        Self {
            meta,
            issues: Vec::new(),
            in_project: BTreeSet::new(),
            next_number: 1,
            failures: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Seeds the remote with every task of a tree, all as Project items.
    /// Nesting becomes sub-issue links; derived values are dropped.
    pub fn from_project(project: &Project) -> Self {
        let mut gateway = Self::new(project.meta.clone());
        for entry in walk(&project.tasks) {
            let mut issue = entry.task.clone();
            issue.subtasks.clear();
            issue.progress = Default::default();
            if let Some(parent) = entry.parent {
                issue.parent = parent.remote_id.assigned();
            }
            gateway.insert(issue, true);
        }
        gateway
    }

    /// Adds an issue. `task.parent` is taken as its sub-issue link.
    pub fn insert(&mut self, mut issue: Task, in_project: bool) {
        if issue.is_new() {
            issue.remote_id = RemoteId(self.next_number);
        }
        let number = issue.remote_id.number();
        self.next_number = self.next_number.max(number + 1);
        issue.node_id.get_or_insert_with(|| format!("I_{number}"));
        if in_project {
            issue.item_id.get_or_insert_with(|| format!("PVTI_{number}"));
            self.in_project.insert(issue.remote_id);
        }
        issue.subtasks.clear();
        self.issues.push(issue);
    }

    /// Makes every call matching `matcher` fail with `error`.
    pub fn fail_when(
        &mut self,
        matcher: impl Fn(&GatewayCall) -> bool + Send + 'static,
        error: RemoteError,
    ) {
        self.failures.push((Box::new(matcher), error));
    }

    pub fn calls(&self) -> &[GatewayCall] {
        &self.calls
    }

    /// Current state of an issue, without subtasks.
    pub fn issue(&self, remote_id: RemoteId) -> Option<&Task> {
        self.issues.iter().find(|issue| issue.remote_id == remote_id)
    }

    pub fn is_in_project(&self, remote_id: RemoteId) -> bool {
        self.in_project.contains(&remote_id)
    }

    /// The Project as a fetch would return it, unfiltered.
    pub fn snapshot(&self) -> Project {
        let items = self
            .issues
            .iter()
            .filter(|issue| self.in_project.contains(&issue.remote_id))
            .cloned()
            .collect();
        Project::new(self.meta.clone(), assemble(items))
    }

    fn record(&mut self, call: GatewayCall) -> Result<(), RemoteError> {
        let failure = self
            .failures
            .iter()
            .find(|(matcher, _)| matcher(&call))
            .map(|(_, error)| error.clone());
        self.calls.push(call);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn issue_mut(&mut self, remote_id: RemoteId) -> Result<&mut Task, RemoteError> {
        self.issues
            .iter_mut()
            .find(|issue| issue.remote_id == remote_id)
            .ok_or_else(|| RemoteError::NotFound(format!("issue {remote_id}")))
    }
}

impl RemoteGateway for InMemoryGateway {
    fn fetch_project(&mut self, filter: &FetchFilter) -> Result<Project, RemoteError> {
        self.record(GatewayCall::Fetch)?;
        let mut project = self.snapshot();
        project.tasks = filter.apply(project.tasks);
        Ok(project)
    }

    fn create_issue(&mut self, draft: &IssueDraft) -> Result<CreatedIssue, RemoteError> {
        self.record(GatewayCall::Create {
            title: draft.title.clone(),
        })?;
        let mut issue = Task::new(draft.title.clone());
        issue.body = Some(draft.body.clone()).filter(|body| !body.is_empty());
        issue.labels = draft.labels.clone();
        issue.assignees = draft.assignees.clone();
        self.insert(issue, false);

        let issue = self
            .issues
            .last()
            .ok_or_else(|| RemoteError::Rejected("issue was not stored".to_string()))?;
        Ok(CreatedIssue {
            remote_id: issue.remote_id,
            node_id: issue.node_id.clone().unwrap_or_default(),
            url: format!("memory://issues/{}", issue.remote_id.number()),
        })
    }

    fn update_issue(
        &mut self,
        remote_id: RemoteId,
        update: &IssueUpdate,
    ) -> Result<(), RemoteError> {
        self.record(GatewayCall::Update {
            remote_id,
            update: update.clone(),
        })?;
        let issue = self.issue_mut(remote_id)?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = Some(body.clone());
        }
        if let Some(assignees) = &update.assignees {
            issue.assignees = assignees.clone();
        }
        if let Some(labels) = &update.labels {
            issue.labels = labels.clone();
        }
        if let Some(closed) = update.closed {
            issue.closed = closed;
        }
        Ok(())
    }

    fn set_date_field(
        &mut self,
        remote_id: RemoteId,
        field: DateField,
        value: Option<Date>,
    ) -> Result<(), RemoteError> {
        self.record(GatewayCall::SetDate {
            remote_id,
            field,
            value,
        })?;
        if !self.in_project.contains(&remote_id) {
            return Err(RemoteError::NotFound(format!(
                "project item for issue {remote_id}"
            )));
        }
        let issue = self.issue_mut(remote_id)?;
        match field {
            DateField::Start => issue.start = value,
            DateField::End => issue.end = value,
        }
        Ok(())
    }

    fn link_parent_child(&mut self, parent: RemoteId, child: RemoteId) -> Result<(), RemoteError> {
        self.record(GatewayCall::Link { parent, child })?;
        self.issue_mut(parent)?;
        self.issue_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn add_to_project(&mut self, remote_id: RemoteId) -> Result<String, RemoteError> {
        self.record(GatewayCall::AddToProject { remote_id })?;
        let issue = self.issue_mut(remote_id)?;
        let item_id = format!("PVTI_{}", remote_id.number());
        issue.item_id = Some(item_id.clone());
        self.in_project.insert(remote_id);
        Ok(item_id)
    }

    fn check_access(&mut self) -> Result<AccessReport, RemoteError> {
        self.record(GatewayCall::CheckAccess)?;
        Ok(AccessReport {
            project_title: self.meta.title.clone(),
            project_url: self.meta.url.clone(),
            start_field: Some("start".to_string()),
            end_field: Some("end".to_string()),
        })
    }
}
