//! Mutation plan construction.

use std::collections::{HashMap, HashSet};

use super::{
    DateChange, Diagnostic, FieldChange, Mutation, MutationPlan, Operation, ReconcileOptions,
    TaskRef,
};
use crate::gateway::IssueDraft;
use crate::models::{walk, DateField, Project, RemoteId, Task, TaskEntry, TaskPath};

/// Computes the operations that bring `remote` in line with `local`.
///
/// Both trees are read only. Remote issues the working file does not
/// mention are left alone.
pub fn plan(local: &Project, remote: &Project, options: ReconcileOptions) -> MutationPlan {
    let remote_index: HashMap<RemoteId, &Task> = remote
        .walk()
        .filter(|entry| !entry.task.is_new())
        .map(|entry| (entry.task.remote_id, entry.task))
        .collect();

    let mut result = MutationPlan::default();
    let mut stale: HashSet<TaskPath> = HashSet::new();

    for entry in walk(&local.tasks) {
        let target = TaskRef::new(entry.path.clone(), entry.task);
        let parent = parent_ref(&entry).filter(|parent| !stale.contains(&parent.path));

        if entry.task.is_new() {
            plan_create(&mut result, target, entry.task, parent);
            continue;
        }

        let Some(remote_task) = remote_index.get(&entry.task.remote_id) else {
            log::warn!("{target} is not in the remote project");
            stale.insert(entry.path.clone());
            result.diagnostics.push(Diagnostic::StaleReference { task: target });
            continue;
        };

        let changes = field_changes(entry.task, remote_task);
        if !changes.is_empty() {
            result.operations.push(Operation {
                target: target.clone(),
                mutation: Mutation::UpdateFields(changes),
            });
        }

        let dates = date_changes(entry.task, Some(remote_task));
        if !dates.is_empty() {
            result.operations.push(Operation {
                target: target.clone(),
                mutation: Mutation::UpdateDates(dates),
            });
        }

        plan_hierarchy(&mut result, target, parent, remote_task.parent, options);
    }

    log::debug!(
        "Planned {} operations with {} diagnostics",
        result.operations.len(),
        result.diagnostics.len()
    );
    result
}

fn parent_ref(entry: &TaskEntry<'_>) -> Option<TaskRef> {
    let parent = entry.parent?;
    let path = entry.path[..entry.path.len() - 1].to_vec();
    Some(TaskRef::new(path, parent))
}

fn plan_create(result: &mut MutationPlan, target: TaskRef, task: &Task, parent: Option<TaskRef>) {
    let draft = IssueDraft {
        title: task.title.trim().to_string(),
        body: task.body.clone().unwrap_or_default(),
        labels: task.labels.clone(),
        assignees: task.assignees.clone(),
    };
    result.operations.push(Operation {
        target: target.clone(),
        mutation: Mutation::Create {
            draft,
            closed: task.closed,
        },
    });
    result.operations.push(Operation {
        target: target.clone(),
        mutation: Mutation::AddToProject,
    });

    let dates = date_changes(task, None);
    if !dates.is_empty() {
        result.operations.push(Operation {
            target: target.clone(),
            mutation: Mutation::UpdateDates(dates),
        });
    }

    if let Some(parent) = parent {
        result.operations.push(Operation {
            target,
            mutation: Mutation::LinkParent {
                parent,
                current: None,
            },
        });
    }
}

fn plan_hierarchy(
    result: &mut MutationPlan,
    target: TaskRef,
    parent: Option<TaskRef>,
    remote_parent: Option<RemoteId>,
    options: ReconcileOptions,
) {
    let local_parent = parent.as_ref().map(|parent| parent.remote_id);
    let matches = match (&parent, remote_parent) {
        (None, None) => true,
        (Some(parent), Some(remote)) => !parent.remote_id.is_new() && parent.remote_id == remote,
        _ => false,
    };
    if matches {
        return;
    }

    match parent {
        // Detaching a sub-issue is not something the gateway can do, so a
        // local root under a remote parent is always just reported.
        Some(parent) if options.enforce_hierarchy => result.operations.push(Operation {
            target,
            mutation: Mutation::LinkParent {
                parent,
                current: remote_parent,
            },
        }),
        _ => result.diagnostics.push(Diagnostic::HierarchyMismatch {
            task: target,
            local_parent,
            remote_parent,
        }),
    }
}

/// Issue attribute differences, in reporting order.
fn field_changes(local: &Task, remote: &Task) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    let title = local.title.trim();
    if title != remote.title.trim() {
        changes.push(FieldChange::Title {
            from: remote.title.clone(),
            to: title.to_string(),
        });
    }

    // Only bodies loaded from a body file take part.
    if let Some(body) = &local.body {
        let remote_body = remote.body.as_deref().unwrap_or_default().trim();
        if body.trim() != remote_body {
            changes.push(FieldChange::Body {
                from: remote_body.to_string(),
                to: body.trim().to_string(),
            });
        }
    }

    if local.assignees != remote.assignees {
        changes.push(FieldChange::Assignees {
            from: remote.assignees.clone(),
            to: local.assignees.clone(),
        });
    }
    if local.labels != remote.labels {
        changes.push(FieldChange::Labels {
            from: remote.labels.clone(),
            to: local.labels.clone(),
        });
    }
    if local.closed != remote.closed {
        changes.push(FieldChange::Closed {
            from: remote.closed,
            to: local.closed,
        });
    }
    changes
}

/// Date differences. A new task is compared against an empty item, so only
/// the dates it has are set.
fn date_changes(local: &Task, remote: Option<&Task>) -> Vec<DateChange> {
    let pairs = [
        (DateField::Start, local.start, remote.and_then(|r| r.start)),
        (DateField::End, local.end, remote.and_then(|r| r.end)),
    ];
    pairs
        .into_iter()
        .filter(|(_, to, from)| to != from)
        .map(|(field, to, from)| DateChange { field, from, to })
        .collect()
}
