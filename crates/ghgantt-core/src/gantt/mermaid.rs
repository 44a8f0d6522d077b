//! Mermaid `gantt` rendering.

use std::fmt::Write as _;
use std::path::Path;

use jiff::civil::Date;

use super::{Schedule, ScheduleEntry};
use crate::error::{IoResultExt, Result};

/// Replaces characters that break Mermaid task lines.
pub fn sanitize(title: &str) -> String {
    title.replace([':', ';'], "-").replace(',', " ")
}

fn task_id(entry: &ScheduleEntry, position: usize) -> String {
    match entry.remote_id.assigned() {
        Some(id) => format!("task{}", id.number()),
        None => format!("new{position}"),
    }
}

/// Renders a schedule as a fenced Mermaid block.
pub fn render(schedule: &Schedule) -> String {
    let mut out = String::new();
    out.push_str("```mermaid\ngantt\n");
    let title = if schedule.title.is_empty() {
        "Project"
    } else {
        schedule.title.as_str()
    };
    let _ = writeln!(out, "    title {}", sanitize(title));
    out.push_str("    dateFormat YYYY-MM-DD\n");
    out.push_str("    tickInterval 1week\n");
    out.push_str("    axisFormat %d-%b\n");
    if schedule.exclude_weekends {
        out.push_str("    excludes weekends\n");
    }
    out.push('\n');

    if schedule.is_empty() {
        out.push_str("    %% No tasks with dates found\n");
    }

    let mut position = 0;
    for section in &schedule.sections {
        let _ = writeln!(out, "    section {}", sanitize(&section.name));
        for entry in &section.entries {
            position += 1;
            let _ = writeln!(
                out,
                "    {} :{}{}, {}, {}d",
                sanitize(&entry.title),
                entry.state.mermaid_tag(),
                task_id(entry, position),
                entry.start,
                entry.duration
            );
        }
        out.push('\n');
    }

    out.push_str("```");
    out
}

/// Wraps rendered content in the chart document written next to the
/// working file.
pub fn document(content: &str, generated_on: Date) -> String {
    format!("# Gantt Chart\n\n_Generated on {generated_on}_\n\n{content}\n")
}

/// Writes a chart document, creating the parent directory if needed.
pub fn save_document(path: &Path, content: &str, generated_on: Date) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).at_path(parent)?;
    }
    std::fs::write(path, document(content, generated_on)).at_path(path)
}
