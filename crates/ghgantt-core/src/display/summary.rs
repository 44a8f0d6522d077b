//! Short summaries of a project and of remote access checks.

use std::fmt;

use crate::gateway::AccessReport;
use crate::models::Project;

/// Title, task count and overall progress of a project.
pub struct ProjectSummary<'a>(pub &'a Project);

impl fmt::Display for ProjectSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let project = self.0;
        let title = if project.meta.title.is_empty() {
            "(untitled project)"
        } else {
            project.meta.title.as_str()
        };
        writeln!(f, "**Project:** {title}  ")?;
        if !project.meta.url.is_empty() {
            writeln!(f, "**URL:** {}  ", project.meta.url)?;
        }
        writeln!(f, "**Tasks:** {}  ", project.total_tasks())?;
        writeln!(f, "**Progress:** {}%", project.meta.progress.value())
    }
}

/// Result of `validate --remote`.
pub struct AccessSummary<'a>(pub &'a AccessReport);

impl fmt::Display for AccessSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "**Project:** {} ({})  ", report.project_title, report.project_url)?;
        for (label, field) in [("Start", &report.start_field), ("End", &report.end_field)] {
            match field {
                Some(name) => writeln!(f, "**{label} field:** {name}  ")?,
                None => writeln!(f, "**{label} field:** missing  ")?,
            }
        }
        Ok(())
    }
}
