//! Sequential execution of a mutation plan.

use std::fmt;

use thiserror::Error;

use super::{Diagnostic, Mutation, MutationPlan, Operation, TaskRef};
use crate::gateway::{IssueUpdate, RemoteError, RemoteGateway};
use crate::models::{Project, RemoteId, TaskPath};

/// Why a single operation did not apply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("{0}")]
    Remote(#[from] RemoteError),

    /// An earlier `Create` this operation depends on failed
    #[error("dependency not created: {0}")]
    DependencyNotCreated(String),
}

/// Result of one executed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    /// The operation, with identifiers resolved at execution time
    pub operation: Operation,
    pub result: Result<(), OperationError>,
}

impl OperationOutcome {
    pub fn is_applied(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate result of [`execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub outcomes: Vec<OperationOutcome>,
    pub diagnostics: Vec<Diagnostic>,

    /// Transport failure that stopped the run
    pub aborted: Option<RemoteError>,

    /// Operations left unattempted after an abort
    pub not_attempted: usize,
}

impl ExecutionReport {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    /// True when every operation applied and the run was not aborted.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.aborted.is_none()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} applied, {} failed", self.applied(), self.failed())?;
        if self.not_attempted > 0 {
            write!(f, ", {} not attempted", self.not_attempted)?;
        }
        Ok(())
    }
}

/// Applies `plan` in order, writing new identifiers into `local`.
///
/// A failed operation is recorded and the run moves on. A transport failure
/// stops the run; `local` still holds every identifier assigned before it.
pub fn execute(
    plan: MutationPlan,
    local: &mut Project,
    gateway: &mut dyn RemoteGateway,
) -> ExecutionReport {
    let mut report = ExecutionReport {
        diagnostics: plan.diagnostics,
        ..Default::default()
    };
    let mut failed_creates: Vec<TaskPath> = Vec::new();
    let total = plan.operations.len();

    for (index, mut operation) in plan.operations.into_iter().enumerate() {
        let result = match blocked_by(&failed_creates, &operation) {
            Some(blocker) => Err(OperationError::DependencyNotCreated(blocker)),
            None => apply(&mut operation, local, gateway),
        };

        if let Err(error) = &result {
            log::warn!(
                "{} on {} failed: {error}",
                operation.mutation.name(),
                operation.target
            );
            if matches!(operation.mutation, Mutation::Create { .. })
                && resolve(local, &operation.target).is_none()
            {
                failed_creates.push(operation.target.path.clone());
            }
        } else {
            log::debug!("{} on {} applied", operation.mutation.name(), operation.target);
        }

        let transport = match &result {
            Err(OperationError::Remote(error)) if error.is_transport() => Some(error.clone()),
            _ => None,
        };
        report.outcomes.push(OperationOutcome { operation, result });

        if let Some(error) = transport {
            report.not_attempted = total - index - 1;
            report.aborted = Some(error);
            break;
        }
    }

    log::info!("Push finished: {report}");
    report
}

/// Names the failed creation an operation depends on, if any.
fn blocked_by(failed_creates: &[TaskPath], operation: &Operation) -> Option<String> {
    failed_creates.iter().find_map(|path| {
        if *path == operation.target.path {
            Some(operation.target.to_string())
        } else {
            match &operation.mutation {
                Mutation::LinkParent { parent, .. } if parent.path == *path => {
                    Some(parent.to_string())
                }
                _ => None,
            }
        }
    })
}

/// Current identifier of the task a reference points at.
fn resolve(local: &Project, task: &TaskRef) -> Option<RemoteId> {
    local
        .task_at(&task.path)
        .and_then(|task| task.remote_id.assigned())
}

fn resolve_or_block(local: &Project, task: &TaskRef) -> Result<RemoteId, OperationError> {
    resolve(local, task).ok_or_else(|| OperationError::DependencyNotCreated(task.to_string()))
}

fn apply(
    operation: &mut Operation,
    local: &mut Project,
    gateway: &mut dyn RemoteGateway,
) -> Result<(), OperationError> {
    if let Mutation::Create { draft, closed } = &operation.mutation {
        let created = gateway.create_issue(draft)?;
        if let Some(task) = local.task_at_mut(&operation.target.path) {
            task.remote_id = created.remote_id;
            task.node_id = Some(created.node_id);
            task.url = Some(created.url);
        }
        operation.target.remote_id = created.remote_id;
        log::info!("Created {}", operation.target);

        if *closed {
            gateway.update_issue(created.remote_id, &IssueUpdate::state(true))?;
        }
        return Ok(());
    }

    let remote_id = resolve_or_block(local, &operation.target)?;
    operation.target.remote_id = remote_id;

    match &mut operation.mutation {
        Mutation::Create { .. } => Ok(()),
        Mutation::UpdateFields(changes) => {
            let mut update = IssueUpdate::default();
            for change in &*changes {
                change.apply_to(&mut update);
            }
            gateway.update_issue(remote_id, &update)?;
            Ok(())
        }
        Mutation::UpdateDates(changes) => {
            for change in &*changes {
                gateway.set_date_field(remote_id, change.field, change.to)?;
            }
            Ok(())
        }
        Mutation::AddToProject => {
            let item_id = gateway.add_to_project(remote_id)?;
            if let Some(task) = local.task_at_mut(&operation.target.path) {
                task.item_id = Some(item_id);
            }
            Ok(())
        }
        Mutation::LinkParent { parent, .. } => {
            let parent_id = resolve_or_block(local, parent)?;
            parent.remote_id = parent_id;
            gateway.link_parent_child(parent_id, remote_id)?;
            if let Some(task) = local.task_at_mut(&operation.target.path) {
                task.parent = None;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayCall, InMemoryGateway};
    use crate::models::{ProjectMeta, Task};
    use crate::reconcile::{plan, ReconcileOptions};

    fn local_with_new_tree() -> Project {
        let mut parent = Task::new("Parent");
        parent.subtasks.push(Task::new("Child"));
        Project::new(ProjectMeta::default(), vec![parent])
    }

    #[test]
    fn test_created_ids_flow_into_children() {
        let mut local = local_with_new_tree();
        let mut gateway = InMemoryGateway::new(ProjectMeta::default());
        let mutation_plan = plan(&local, &gateway.snapshot(), ReconcileOptions::default());

        let report = execute(mutation_plan, &mut local, &mut gateway);

        assert!(report.is_success(), "{report}");
        assert_eq!(local.tasks[0].remote_id, RemoteId(1));
        assert_eq!(local.tasks[0].subtasks[0].remote_id, RemoteId(2));
        assert_eq!(local.tasks[0].item_id.as_deref(), Some("PVTI_1"));
        assert!(gateway.calls().contains(&GatewayCall::Link {
            parent: RemoteId(1),
            child: RemoteId(2),
        }));
    }

    #[test]
    fn test_failed_create_blocks_dependents() {
        let mut local = local_with_new_tree();
        let mut gateway = InMemoryGateway::new(ProjectMeta::default());
        gateway.fail_when(
            |call| matches!(call, GatewayCall::Create { title } if title == "Parent"),
            RemoteError::Rejected("title rejected".to_string()),
        );
        let mutation_plan = plan(&local, &gateway.snapshot(), ReconcileOptions::default());

        let report = execute(mutation_plan, &mut local, &mut gateway);

        // Parent create and add fail, child create and add succeed, link fails.
        assert_eq!(report.applied(), 2);
        assert_eq!(report.failed(), 3);
        assert!(report.aborted.is_none());
        let link = report.outcomes.last().unwrap();
        assert!(matches!(
            link.result,
            Err(OperationError::DependencyNotCreated(_))
        ));
        assert!(local.tasks[0].is_new());
        assert!(!local.tasks[0].subtasks[0].is_new());
    }

    #[test]
    fn test_transport_error_aborts_remaining_operations() {
        let mut local = local_with_new_tree();
        let mut gateway = InMemoryGateway::new(ProjectMeta::default());
        gateway.fail_when(
            |call| matches!(call, GatewayCall::AddToProject { .. }),
            RemoteError::Transport("connection reset".to_string()),
        );
        let mutation_plan = plan(&local, &gateway.snapshot(), ReconcileOptions::default());

        let report = execute(mutation_plan, &mut local, &mut gateway);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.not_attempted, 3);
        assert!(report.aborted.as_ref().is_some_and(RemoteError::is_transport));
        assert_eq!(local.tasks[0].remote_id, RemoteId(1));
        assert_eq!(report.to_string(), "1 applied, 1 failed, 3 not attempted");
    }

    #[test]
    fn test_closed_new_task_is_closed_after_create() {
        let mut task = Task::new("Already done");
        task.closed = true;
        let mut local = Project::new(ProjectMeta::default(), vec![task]);
        let mut gateway = InMemoryGateway::new(ProjectMeta::default());
        let mutation_plan = plan(&local, &gateway.snapshot(), ReconcileOptions::default());

        let report = execute(mutation_plan, &mut local, &mut gateway);

        assert!(report.is_success());
        assert!(gateway.issue(RemoteId(1)).unwrap().closed);
    }
}
