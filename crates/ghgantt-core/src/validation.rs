//! Validation of task trees read from a working file.
//!
//! Problems are collected, never reported one at a time: a user fixing a
//! working file sees every issue from a single run. Both format adapters
//! feed their own parse problems (unreadable dates, broken parent pointers)
//! into the same [`ValidationErrors`] before the tree-level checks run.

use std::collections::HashMap;
use std::fmt;

use jiff::civil::Date;

use crate::models::{walk, RemoteId, Task};

/// Deepest sub-issue nesting the remote platform accepts.
pub const MAX_DEPTH: usize = 8;

/// What is wrong with a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    EmptyTitle,
    InvertedDates { start: Date, end: Date },
    TooDeep { depth: usize },
    DuplicateRemoteId { first_seen: String },
    InvalidDate { field: String, value: String },
    InvalidValue { field: String, value: String },
    MissingParent { parent: RemoteId },
    ForwardParent { parent: RemoteId },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::EmptyTitle => write!(f, "title is empty"),
            IssueKind::InvertedDates { start, end } => {
                write!(f, "end date {end} is before start date {start}")
            }
            IssueKind::TooDeep { depth } => write!(
                f,
                "nested {depth} levels deep, the limit is {MAX_DEPTH}"
            ),
            IssueKind::DuplicateRemoteId { first_seen } => {
                write!(f, "issue number already used at {first_seen}")
            }
            IssueKind::InvalidDate { field, value } => {
                write!(f, "{field} '{value}' is not a YYYY-MM-DD date")
            }
            IssueKind::InvalidValue { field, value } => {
                write!(f, "{field} '{value}' is not valid")
            }
            IssueKind::MissingParent { parent } => {
                write!(f, "missing parent reference: no row for {parent}")
            }
            IssueKind::ForwardParent { parent } => write!(
                f,
                "forward parent reference: {parent} appears on a later row"
            ),
        }
    }
}

/// A single problem found in a working file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Outline number (`1.2.1`) or spreadsheet row (`row 4`)
    pub location: String,

    pub title: String,

    pub remote_id: RemoteId,

    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, task: &Task, kind: IssueKind) -> Self {
        Self {
            location: location.into(),
            title: task.title.clone(),
            remote_id: task.remote_id,
            kind,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\": {}",
            self.location, self.remote_id, self.title, self.kind
        )
    }
}

/// Every problem found in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.issues.extend(other.issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }

    /// Whether any issue has the given kind.
    pub fn contains(&self, predicate: impl Fn(&IssueKind) -> bool) -> bool {
        self.issues.iter().any(|issue| predicate(&issue.kind))
    }

    /// `Ok` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.issues.len() == 1 {
            "problem"
        } else {
            "problems"
        };
        write!(f, "Validation failed with {} {noun}:", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Runs the tree-level checks and appends their findings to `issues`.
///
/// Checks: non-empty titles, `start <= end`, nesting within [`MAX_DEPTH`],
/// and unique issue numbers. A too-deep branch is reported once, at the
/// first task below the limit.
pub fn check_tree(tasks: &[Task], issues: &mut ValidationErrors) {
    let mut seen: HashMap<RemoteId, String> = HashMap::new();

    for entry in walk(tasks) {
        let task = entry.task;
        let location = entry.outline();

        if task.title.trim().is_empty() {
            issues.push(ValidationIssue::new(&location, task, IssueKind::EmptyTitle));
        }

        if let (Some(start), Some(end)) = (task.start, task.end) {
            if end < start {
                issues.push(ValidationIssue::new(
                    &location,
                    task,
                    IssueKind::InvertedDates { start, end },
                ));
            }
        }

        if entry.depth() == MAX_DEPTH + 1 {
            issues.push(ValidationIssue::new(
                &location,
                task,
                IssueKind::TooDeep {
                    depth: entry.depth() + task.depth() - 1,
                },
            ));
        }

        if let Some(remote_id) = task.remote_id.assigned() {
            if let Some(first_seen) = seen.get(&remote_id) {
                issues.push(ValidationIssue::new(
                    &location,
                    task,
                    IssueKind::DuplicateRemoteId {
                        first_seen: first_seen.clone(),
                    },
                ));
            } else {
                seen.insert(remote_id, location);
            }
        }
    }
}

/// Validates a task tree on its own.
pub fn validate(tasks: &[Task]) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();
    check_tree(tasks, &mut issues);
    issues.into_result()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn chain(levels: usize) -> Task {
        let mut task = Task::existing(levels as u64, format!("Level {levels}"));
        for level in (1..levels).rev() {
            let mut parent = Task::existing(level as u64, format!("Level {level}"));
            parent.subtasks.push(task);
            task = parent;
        }
        task
    }

    #[test]
    fn test_valid_tree_passes() {
        let mut task = Task::existing(100, "Plan");
        task.start = Some(date(2026, 1, 5));
        task.end = Some(date(2026, 1, 5));

        assert!(validate(&[task, chain(MAX_DEPTH)]).is_ok());
    }

    #[test]
    fn test_problems_are_collected_together() {
        let mut inverted = Task::existing(5, "Inverted");
        inverted.start = Some(date(2026, 2, 10));
        inverted.end = Some(date(2026, 2, 1));
        let blank = Task::new("   ");

        let errors = validate(&[inverted, blank]).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.contains(|kind| matches!(kind, IssueKind::InvertedDates { .. })));
        assert!(errors.contains(|kind| *kind == IssueKind::EmptyTitle));
    }

    #[test]
    fn test_depth_nine_is_rejected_at_offending_task() {
        let errors = validate(&[chain(MAX_DEPTH + 1)]).unwrap_err();

        assert_eq!(errors.len(), 1);
        let issue = errors.iter().next().unwrap();
        assert_eq!(issue.remote_id, RemoteId(9));
        assert_eq!(issue.kind, IssueKind::TooDeep { depth: 9 });
        assert_eq!(issue.location, "1.1.1.1.1.1.1.1.1");
    }

    #[test]
    fn test_duplicate_remote_ids() {
        let errors = validate(&[Task::existing(4, "A"), Task::existing(4, "B")]).unwrap_err();
        let issue = errors.iter().next().unwrap();

        assert_eq!(issue.title, "B");
        assert_eq!(
            issue.kind,
            IssueKind::DuplicateRemoteId {
                first_seen: "1".to_string()
            }
        );
    }

    #[test]
    fn test_new_tasks_may_share_sentinel() {
        assert!(validate(&[Task::new("A"), Task::new("B")]).is_ok());
    }

    #[test]
    fn test_report_lists_every_issue() {
        let errors = validate(&[Task::new(""), Task::existing(3, "")]).unwrap_err();
        let report = errors.to_string();

        assert!(report.starts_with("Validation failed with 2 problems:"));
        assert!(report.contains("1 (new) \"\": title is empty"));
        assert!(report.contains("2 #3 \"\": title is empty"));
    }
}
