//! Markdown table of every task, dated or not.

use std::fmt::Write as _;

use crate::formats::join_set;
use crate::models::{walk, Project, VisualState};

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Renders the project as a markdown table; nesting is shown with `└─`.
pub fn render(project: &Project) -> String {
    let mut out = String::new();
    out.push_str("# Project Tasks\n\n");
    let _ = writeln!(out, "**Project:** {}  ", cell(&project.meta.title));
    let _ = writeln!(out, "**Progress:** {}%\n", project.meta.progress.value());
    out.push_str("| # | Title | Start | End | Status | Progress | Assignees |\n");
    out.push_str("|---|-------|-------|-----|--------|----------|-----------|\n");

    for entry in walk(&project.tasks) {
        let task = entry.task;
        let prefix = "└─ ".repeat(entry.depth() - 1);
        let date = |value: Option<jiff::civil::Date>| {
            value.map_or_else(|| "-".to_string(), |d| d.to_string())
        };
        let assignees = join_set(&task.assignees);
        let _ = writeln!(
            out,
            "| {} | {}{} | {} | {} | {} | {}% | {} |",
            task.remote_id,
            prefix,
            cell(&task.title),
            date(task.start),
            date(task.end),
            VisualState::of(task).label(),
            task.progress.value(),
            if assignees.is_empty() { "-" } else { assignees.as_str() }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectMeta, Task};

    #[test]
    fn test_table_lists_undated_and_nested_tasks() {
        let mut parent = Task::existing(1, "Backend");
        let mut child = Task::existing(2, "Schema | v2");
        child.start = Some(jiff::civil::date(2026, 1, 5));
        child.assignees.insert("octocat".to_string());
        parent.subtasks.push(child);
        let project = Project::new(ProjectMeta::default(), vec![parent]);

        let table = render(&project);

        assert!(table.contains("| #1 | Backend | - | - | Open | 0% | - |"));
        assert!(table.contains("| #2 | └─ Schema \\| v2 | 2026-01-05 | - | Open | 0% | octocat |"));
    }
}
