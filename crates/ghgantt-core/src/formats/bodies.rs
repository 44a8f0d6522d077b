//! Issue description files, `issues/<number>.md`.
//!
//! Each file starts with a `<!-- Issue #N: title -->` comment and a blank
//! line, followed by the body text. A missing or empty file leaves the
//! task's body untracked, so push never touches that description.

use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};
use crate::models::{RemoteId, Task};

const HEADER_PREFIX: &str = "<!-- Issue #";

/// Path of the body file for an issue.
pub fn body_path(issues_dir: &Path, remote_id: RemoteId) -> PathBuf {
    issues_dir.join(format!("{}.md", remote_id.number()))
}

/// Renders the content of a body file.
pub fn render(task: &Task, body: &str) -> String {
    format!(
        "{HEADER_PREFIX}{}: {} -->\n\n{}",
        task.remote_id.number(),
        task.title,
        body
    )
}

/// Extracts the body from file content. Blank content is no body.
pub fn parse(content: &str) -> Option<String> {
    let text = if content.starts_with(HEADER_PREFIX) {
        content.split_once('\n').map_or("", |(_, rest)| rest)
    } else {
        content
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Writes a body file for every created task with a non-empty body.
/// Returns the number of files written.
pub fn save_all(tasks: &[Task], issues_dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in crate::models::walk(tasks) {
        let task = entry.task;
        let Some(body) = task.body.as_deref().filter(|body| !body.trim().is_empty()) else {
            continue;
        };
        if task.is_new() {
            continue;
        }
        if count == 0 {
            std::fs::create_dir_all(issues_dir).at_path(issues_dir)?;
        }
        let path = body_path(issues_dir, task.remote_id);
        std::fs::write(&path, render(task, body)).at_path(&path)?;
        count += 1;
    }
    Ok(count)
}

/// Fills `body` from the matching files. Tasks without a file keep `None`.
/// Returns the number of bodies loaded.
pub fn load_all(tasks: &mut [Task], issues_dir: &Path) -> Result<usize> {
    let mut count = 0;
    for task in tasks.iter_mut() {
        if let Some(remote_id) = task.remote_id.assigned() {
            let path = body_path(issues_dir, remote_id);
            if path.is_file() {
                let content = std::fs::read_to_string(&path).at_path(&path)?;
                task.body = parse(&content);
                if task.body.is_some() {
                    count += 1;
                }
            }
        }
        count += load_all(&mut task.subtasks, issues_dir)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_header_is_stripped() {
        let mut task = Task::existing(7, "Write docs");
        task.body = Some("Line one\n\nLine two".to_string());
        let content = render(&task, "Line one\n\nLine two");

        assert!(content.starts_with("<!-- Issue #7: Write docs -->\n\n"));
        assert_eq!(parse(&content).as_deref(), Some("Line one\n\nLine two"));
    }

    #[test]
    fn test_blank_file_is_no_body() {
        assert_eq!(parse("<!-- Issue #7: Write docs -->\n\n   \n"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("  plain text \n").as_deref(), Some("plain text"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let issues_dir = temp_dir.path().join("issues");

        let mut parent = Task::existing(1, "Parent");
        parent.body = Some("Parent body".to_string());
        let mut child = Task::existing(2, "Child");
        child.body = Some("   ".to_string());
        let mut fresh = Task::new("Fresh");
        fresh.body = Some("not saved".to_string());
        parent.subtasks = vec![child, fresh];
        let tasks = vec![parent];

        assert_eq!(save_all(&tasks, &issues_dir).unwrap(), 1);
        assert!(issues_dir.join("1.md").is_file());
        assert!(!issues_dir.join("2.md").exists());

        let mut reloaded = tasks.clone();
        reloaded[0].body = None;
        reloaded[0].subtasks[0].body = None;
        assert_eq!(load_all(&mut reloaded, &issues_dir).unwrap(), 1);
        assert_eq!(reloaded[0].body.as_deref(), Some("Parent body"));
        assert_eq!(reloaded[0].subtasks[0].body, None);
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut tasks = vec![Task::existing(3, "Anything")];

        assert_eq!(load_all(&mut tasks, &temp_dir.path().join("issues")).unwrap(), 0);
        assert_eq!(tasks[0].body, None);
    }
}
