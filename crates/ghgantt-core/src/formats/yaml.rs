//! YAML working file.
//!
//! ```yaml
//! project:
//!   id: PVT_kwDOA
//!   number: 3
//!   title: Roadmap
//!   url: https://github.com/orgs/acme/projects/3
//!   progress: 50
//! tasks:
//! - issue: 12
//!   title: Backend
//!   start: 2026-01-05
//!   end: 2026-02-27
//!   progress: 50
//!   subtasks:
//!   - issue: 0
//!     title: Design API
//! ```
//!
//! Nesting under `subtasks` is the hierarchy. `issue: 0` marks a task to be
//! created. `milestone` and `progress` are written for reference and ignored
//! as input except for leaf progress.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::parse_date;
use crate::error::{IoResultExt, Result, SyncError};
use crate::models::{outline, Derived, Project, ProjectMeta, RemoteId, Task};
use crate::progress;
use crate::validation::{check_tree, IssueKind, ValidationErrors, ValidationIssue};

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentDto {
    #[serde(default)]
    project: ProjectDto,

    #[serde(default)]
    tasks: Vec<TaskDto>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectDto {
    #[serde(default)]
    id: String,

    #[serde(default)]
    number: u64,

    #[serde(default)]
    title: String,

    #[serde(default)]
    url: String,

    #[serde(default)]
    progress: u8,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskDto {
    #[serde(default)]
    issue: serde_yaml::Value,

    #[serde(default)]
    title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    assignees: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    milestone: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    closed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    issue_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_item_id: Option<String>,

    #[serde(default)]
    progress: serde_yaml::Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subtasks: Vec<TaskDto>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            issue: serde_yaml::Value::from(task.remote_id.number()),
            title: task.title.clone(),
            start: task.start.map(|d| serde_yaml::Value::String(d.to_string())),
            end: task.end.map(|d| serde_yaml::Value::String(d.to_string())),
            assignees: task.assignees.iter().cloned().collect(),
            labels: task.labels.iter().cloned().collect(),
            milestone: task.milestone.get().clone(),
            closed: task.closed,
            url: task.url.clone(),
            issue_id: task.node_id.clone(),
            project_item_id: task.item_id.clone(),
            progress: serde_yaml::Value::from(task.progress.value()),
            subtasks: task.subtasks.iter().map(TaskDto::from).collect(),
        }
    }
}

impl From<&Project> for DocumentDto {
    fn from(project: &Project) -> Self {
        let meta = &project.meta;
        Self {
            project: ProjectDto {
                id: meta.id.clone(),
                number: meta.number,
                title: meta.title.clone(),
                url: meta.url.clone(),
                progress: meta.progress.value(),
            },
            tasks: project.tasks.iter().map(TaskDto::from).collect(),
        }
    }
}

fn scalar_text(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Reads a date scalar. Missing, null and blank values are "no date".
fn date_value(
    value: Option<&serde_yaml::Value>,
) -> std::result::Result<Option<jiff::civil::Date>, String> {
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(text)) => parse_date(text),
        Some(other) => Err(scalar_text(other)),
    }
}

/// Reads a non-negative integer. Null and blank values are zero.
fn number_value(value: &serde_yaml::Value) -> std::result::Result<u64, String> {
    match value {
        serde_yaml::Value::Null => Ok(0),
        serde_yaml::Value::Number(number) => number.as_u64().ok_or_else(|| number.to_string()),
        serde_yaml::Value::String(text) if text.trim().is_empty() => Ok(0),
        serde_yaml::Value::String(text) => {
            text.trim().parse::<u64>().map_err(|_| text.to_string())
        }
        other => Err(scalar_text(other)),
    }
}

fn into_task(dto: TaskDto, path: &mut Vec<usize>, issues: &mut ValidationErrors) -> Task {
    let issue = number_value(&dto.issue);
    let mut task = Task {
        remote_id: RemoteId(issue.as_ref().copied().unwrap_or_default()),
        node_id: dto.issue_id,
        item_id: dto.project_item_id,
        url: dto.url,
        title: dto.title,
        assignees: dto.assignees.into_iter().collect(),
        labels: dto.labels.into_iter().collect(),
        closed: dto.closed,
        milestone: Derived::new(dto.milestone),
        ..Default::default()
    };

    let mut invalid = Vec::new();
    if let Err(value) = issue {
        invalid.push(IssueKind::InvalidValue {
            field: "issue".to_string(),
            value,
        });
    }
    match number_value(&dto.progress) {
        Ok(value) if value <= 100 => task.progress = Derived::new(value as u8),
        Ok(value) => invalid.push(IssueKind::InvalidValue {
            field: "progress".to_string(),
            value: value.to_string(),
        }),
        Err(value) => invalid.push(IssueKind::InvalidValue {
            field: "progress".to_string(),
            value,
        }),
    }

    for (field, raw) in [("start", dto.start.as_ref()), ("end", dto.end.as_ref())] {
        match date_value(raw) {
            Ok(date) if field == "start" => task.start = date,
            Ok(date) => task.end = date,
            Err(value) => invalid.push(IssueKind::InvalidDate {
                field: field.to_string(),
                value,
            }),
        }
    }
    for kind in invalid {
        issues.push(ValidationIssue::new(outline(path), &task, kind));
    }

    for (index, child) in dto.subtasks.into_iter().enumerate() {
        path.push(index);
        let subtask = into_task(child, path, issues);
        task.subtasks.push(subtask);
        path.pop();
    }
    task
}

/// Parses YAML text into a validated project with recomputed progress.
pub fn from_str(text: &str, origin: &Path) -> Result<Project> {
    let document: DocumentDto = if text.trim().is_empty() {
        DocumentDto::default()
    } else {
        serde_yaml::from_str(text).map_err(|source| SyncError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?
    };

    let mut issues = ValidationErrors::new();
    let mut tasks = Vec::with_capacity(document.tasks.len());
    for (index, dto) in document.tasks.into_iter().enumerate() {
        let mut path = vec![index];
        tasks.push(into_task(dto, &mut path, &mut issues));
    }
    check_tree(&tasks, &mut issues);
    issues.into_result()?;

    let meta = ProjectMeta {
        id: document.project.id,
        number: document.project.number,
        title: document.project.title,
        url: document.project.url,
        progress: Derived::new(document.project.progress),
    };
    let mut project = Project::new(meta, tasks);
    progress::recompute(&mut project);
    Ok(project)
}

/// Renders a project as YAML text.
pub fn to_string(project: &Project, origin: &Path) -> Result<String> {
    serde_yaml::to_string(&DocumentDto::from(project)).map_err(|source| SyncError::Yaml {
        path: origin.to_path_buf(),
        source,
    })
}

pub fn load(path: &Path) -> Result<Project> {
    let text = std::fs::read_to_string(path).at_path(path)?;
    let project = from_str(&text, path)?;
    log::debug!(
        "Read {} tasks from {}",
        project.total_tasks(),
        path.display()
    );
    Ok(project)
}

pub fn save(path: &Path, project: &Project) -> Result<()> {
    let text = to_string(project, path)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).at_path(dir)?;
    }
    std::fs::write(path, text).at_path(path)?;
    log::debug!("Wrote {} tasks to {}", project.total_tasks(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::validation::MAX_DEPTH;

    const SAMPLE: &str = r#"
project:
  id: PVT_1
  number: 3
  title: Roadmap
  url: https://github.com/orgs/acme/projects/3
tasks:
- issue: 12
  title: Backend
  start: 2026-01-05
  end: '2026-02-27'
  labels: [backend, api]
  milestone: v1
  progress: 5
  subtasks:
  - issue: 13
    title: Schema
    closed: true
  - issue: 0
    title: Design API
    start: 2026-01-20
    end: 2026-01-22
    assignees: [octocat]
    progress: 40
"#;

    fn parse(text: &str) -> Result<Project> {
        from_str(text, Path::new("tasks.yaml"))
    }

    #[test]
    fn test_parse_nested_document() {
        let project = parse(SAMPLE).unwrap();

        assert_eq!(project.meta.number, 3);
        assert_eq!(project.total_tasks(), 3);

        let backend = &project.tasks[0];
        assert_eq!(backend.remote_id, RemoteId(12));
        assert_eq!(backend.start, Some(date(2026, 1, 5)));
        assert_eq!(backend.end, Some(date(2026, 2, 27)));
        assert_eq!(backend.milestone.get().as_deref(), Some("v1"));
        assert!(backend.labels.contains("api"));

        let design = &backend.subtasks[1];
        assert!(design.is_new());
        assert!(design.assignees.contains("octocat"));
    }

    #[test]
    fn test_parent_progress_is_recomputed() {
        let project = parse(SAMPLE).unwrap();

        assert_eq!(project.tasks[0].progress.value(), 50);
        assert_eq!(project.tasks[0].subtasks[0].progress.value(), 100);
        assert_eq!(project.tasks[0].subtasks[1].progress.value(), 40);
        assert_eq!(project.meta.progress.value(), 0);
    }

    #[test]
    fn test_absent_dates_are_not_written() {
        let mut task = Task::existing(4, "Unscheduled");
        task.start = Some(date(2026, 3, 1));
        let project = Project::new(ProjectMeta::default(), vec![task]);

        let text = to_string(&project, Path::new("t.yaml")).unwrap();

        assert!(text.contains("2026-03-01"));
        assert!(!text.contains("end:"));
        assert!(!text.contains("''"));
    }

    #[test]
    fn test_write_then_parse_preserves_tree() {
        let original = parse(SAMPLE).unwrap();
        let text = to_string(&original, Path::new("t.yaml")).unwrap();
        let reparsed = parse(&text).unwrap();

        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_all_problems_reported_together() {
        let text = r#"
tasks:
- issue: 1
  title: ""
  start: 2026-02-10
  end: 2026-02-01
- issue: 1
  title: Twice
  start: next week
"#;
        let error = parse(text).unwrap_err();
        let errors = match error {
            SyncError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        };

        assert_eq!(errors.len(), 4);
        assert!(errors.contains(|kind| matches!(kind, IssueKind::InvalidDate { .. })));
        assert!(errors.contains(|kind| matches!(kind, IssueKind::DuplicateRemoteId { .. })));
    }

    #[test]
    fn test_bad_numbers_are_collected_with_other_problems() {
        let text = r#"
tasks:
- issue: abc
  title: Backend
  progress: 300
- issue: 2
  title: ""
  progress: half
"#;
        let error = parse(text).unwrap_err();
        let errors = match error {
            SyncError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        };

        assert_eq!(errors.len(), 4);
        let values: Vec<_> = errors
            .iter()
            .filter_map(|issue| match &issue.kind {
                IssueKind::InvalidValue { field, value } => Some((field.as_str(), value.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(values, [("issue", "abc"), ("progress", "300"), ("progress", "half")]);
        assert!(errors.contains(|kind| matches!(kind, IssueKind::EmptyTitle)));
    }

    #[test]
    fn test_numbers_are_written_unquoted() {
        let mut task = Task::existing(7, "Leaf");
        task.progress = Derived::new(40);
        let project = Project::new(ProjectMeta::default(), vec![task]);

        let text = to_string(&project, Path::new("t.yaml")).unwrap();

        assert!(text.contains("issue: 7\n"));
        assert!(text.contains("progress: 40\n"));
    }

    #[test]
    fn test_depth_nine_is_rejected() {
        let mut text = String::from("tasks:\n");
        for level in 0..=MAX_DEPTH {
            let indent = "  ".repeat(level * 2);
            if level > 0 {
                text.push_str(&format!("{}  subtasks:\n", "  ".repeat((level - 1) * 2)));
            }
            text.push_str(&format!(
                "{indent}- issue: {}\n{indent}  title: Level {}\n",
                level + 1,
                level + 1
            ));
        }

        let error = parse(&text).unwrap_err();
        let errors = match error {
            SyncError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        };
        let issue = errors.iter().next().unwrap();
        assert_eq!(issue.remote_id, RemoteId(9));
        assert!(matches!(issue.kind, IssueKind::TooDeep { .. }));
    }

    #[test]
    fn test_malformed_yaml_names_the_file() {
        let error = parse("tasks: [").unwrap_err();
        assert!(error.to_string().contains("tasks.yaml"));
    }

    #[test]
    fn test_empty_document_is_empty_project() {
        assert!(parse("").unwrap().is_empty());
    }
}
