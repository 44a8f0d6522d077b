//! Human-readable change list for a mutation plan.

use std::collections::BTreeSet;
use std::fmt;

use jiff::civil::Date;

use crate::models::RemoteId;
use crate::reconcile::{
    DateChange, Diagnostic, FieldChange, Mutation, MutationPlan, Operation, TaskRef,
};

/// Formats a set for a change line; empty sets read `(none)`.
pub(crate) fn set_text(items: &BTreeSet<String>) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub(crate) fn date_text(date: Option<Date>) -> String {
    date.map_or_else(|| "(none)".to_string(), |date| date.to_string())
}

fn state_text(closed: bool) -> &'static str {
    if closed {
        "closed"
    } else {
        "open"
    }
}

fn parent_text(parent: Option<RemoteId>) -> String {
    parent.map_or_else(|| "(none)".to_string(), |id| id.to_string())
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::Title { from, to } => write!(f, "title: \"{from}\" → \"{to}\""),
            FieldChange::Body { from, to } => write!(
                f,
                "body: {} chars → {} chars",
                from.chars().count(),
                to.chars().count()
            ),
            FieldChange::Assignees { from, to } => {
                write!(f, "assignees: {} → {}", set_text(from), set_text(to))
            }
            FieldChange::Labels { from, to } => {
                write!(f, "labels: {} → {}", set_text(from), set_text(to))
            }
            FieldChange::Closed { from, to } => {
                write!(f, "state: {} → {}", state_text(*from), state_text(*to))
            }
        }
    }
}

impl fmt::Display for DateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.field.as_str(),
            date_text(self.from),
            date_text(self.to)
        )
    }
}

/// Operations of one task, in plan order.
struct TaskChanges<'a> {
    target: &'a TaskRef,
    operations: Vec<&'a Operation>,
}

fn group(plan: &MutationPlan) -> Vec<TaskChanges<'_>> {
    let mut groups: Vec<TaskChanges<'_>> = Vec::new();
    for operation in &plan.operations {
        match groups
            .iter_mut()
            .find(|group| group.target.path == operation.target.path)
        {
            Some(group) => group.operations.push(operation),
            None => groups.push(TaskChanges {
                target: &operation.target,
                operations: vec![operation],
            }),
        }
    }
    groups
}

fn write_details(f: &mut fmt::Formatter<'_>, group: &TaskChanges<'_>) -> fmt::Result {
    for operation in &group.operations {
        match &operation.mutation {
            Mutation::Create { draft, closed } => {
                if !draft.labels.is_empty() {
                    writeln!(f, "  - labels: {}", set_text(&draft.labels))?;
                }
                if !draft.assignees.is_empty() {
                    writeln!(f, "  - assignees: {}", set_text(&draft.assignees))?;
                }
                if *closed {
                    writeln!(f, "  - state: closed")?;
                }
            }
            Mutation::UpdateFields(changes) => {
                for change in changes {
                    writeln!(f, "  - {change}")?;
                }
            }
            Mutation::UpdateDates(changes) => {
                for change in changes {
                    writeln!(f, "  - {change}")?;
                }
            }
            Mutation::AddToProject => {}
            Mutation::LinkParent { parent, current } => writeln!(
                f,
                "  - parent: {} → {}",
                parent_text(*current),
                parent
            )?,
        }
    }
    Ok(())
}

/// Markdown change list shown by `push --dry-run` and `status`.
pub struct ChangeList<'a>(pub &'a MutationPlan);

impl fmt::Display for ChangeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.0;
        let groups = group(plan);
        let (created, modified): (Vec<_>, Vec<_>) = groups.iter().partition(|group| {
            group
                .operations
                .iter()
                .any(|op| matches!(op.mutation, Mutation::Create { .. }))
        });

        if plan.is_empty() {
            writeln!(f, "No changes. The project is up to date.")?;
        }

        if !created.is_empty() {
            writeln!(f, "## New tasks ({})", created.len())?;
            writeln!(f)?;
            for group in created {
                writeln!(f, "- **{}**", group.target.title)?;
                write_details(f, group)?;
            }
            writeln!(f)?;
        }

        if !modified.is_empty() {
            writeln!(f, "## Modified tasks ({})", modified.len())?;
            writeln!(f)?;
            for group in modified {
                writeln!(f, "- **{}**", group.target)?;
                write_details(f, group)?;
            }
            writeln!(f)?;
        }

        write!(f, "{}", Diagnostics(&plan.diagnostics))?;

        if !plan.is_empty() {
            writeln!(f, "**{} operation(s) planned.**", plan.len())?;
        }
        Ok(())
    }
}

/// Markdown list of plan diagnostics; empty when there are none.
pub struct Diagnostics<'a>(pub &'a [Diagnostic]);

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        writeln!(f, "## Notes")?;
        writeln!(f)?;
        for diagnostic in self.0 {
            writeln!(f, "- {diagnostic}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::models::{DateField, Project, ProjectMeta, Task};
    use crate::reconcile::{plan, ReconcileOptions};

    #[test]
    fn test_change_list_sections() {
        let mut fresh = Task::new("Design API");
        fresh.start = Some(date(2026, 1, 20));
        let mut local_existing = Task::existing(42, "Ship");
        local_existing.labels.insert("release".to_string());
        let mut remote_existing = Task::existing(42, "Ship");
        remote_existing.closed = true;

        let local = Project::new(ProjectMeta::default(), vec![fresh, local_existing]);
        let remote = Project::new(ProjectMeta::default(), vec![remote_existing]);
        let output = ChangeList(&plan(&local, &remote, ReconcileOptions::default())).to_string();

        assert!(output.contains("## New tasks (1)"));
        assert!(output.contains("- **Design API**\n  - start: (none) → 2026-01-20"));
        assert!(output.contains("## Modified tasks (1)"));
        assert!(output.contains("- **#42 \"Ship\"**"));
        assert!(output.contains("  - labels: (none) → release"));
        assert!(output.contains("  - state: closed → open"));
        assert!(output.contains("**4 operation(s) planned.**"));
    }

    #[test]
    fn test_empty_plan() {
        let output = ChangeList(&MutationPlan::default()).to_string();
        assert_eq!(output, "No changes. The project is up to date.\n");
    }

    #[test]
    fn test_date_change_text() {
        let change = DateChange {
            field: DateField::End,
            from: Some(date(2026, 1, 22)),
            to: None,
        };
        assert_eq!(change.to_string(), "end: 2026-01-22 → (none)");
    }
}
