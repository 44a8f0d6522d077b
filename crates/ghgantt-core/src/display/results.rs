//! Result wrappers for pull, push and validation runs.

use std::fmt;
use std::path::PathBuf;

use super::changes::Diagnostics;
use super::summary::ProjectSummary;
use crate::models::Project;
use crate::reconcile::{ExecutionReport, Mutation};
use crate::validation::ValidationErrors;

/// Outcome of a push, with the applied/failed summary and every failure.
pub struct PushResult<'a>(pub &'a ExecutionReport);

impl fmt::Display for PushResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "## Push summary")?;
        writeln!(f)?;
        writeln!(f, "**{report}**")?;
        writeln!(f)?;

        let created: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.is_applied() && matches!(o.operation.mutation, Mutation::Create { .. }))
            .collect();
        if !created.is_empty() {
            writeln!(f, "### Created")?;
            writeln!(f)?;
            for outcome in created {
                writeln!(f, "- {}", outcome.operation.target)?;
            }
            writeln!(f)?;
        }

        if report.failed() > 0 {
            writeln!(f, "### Failed")?;
            writeln!(f)?;
            for outcome in report.failures() {
                if let Err(error) = &outcome.result {
                    writeln!(
                        f,
                        "- {} {}: {error}",
                        outcome.operation.mutation.name(),
                        outcome.operation.target
                    )?;
                }
            }
            writeln!(f)?;
        }

        if let Some(error) = &report.aborted {
            writeln!(f, "Run stopped early: {error}")?;
            writeln!(f)?;
        }

        write!(f, "{}", Diagnostics(&report.diagnostics))
    }
}

/// Files written by a pull, followed by the project summary.
pub struct PullResult<'a> {
    pub project: &'a Project,
    pub files: Vec<PathBuf>,
    pub bodies: usize,
}

impl fmt::Display for PullResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Pulled project")?;
        writeln!(f)?;
        for file in &self.files {
            writeln!(f, "- wrote `{}`", file.display())?;
        }
        if self.bodies > 0 {
            writeln!(f, "- wrote {} issue body file(s)", self.bodies)?;
        }
        writeln!(f)?;
        write!(f, "{}", ProjectSummary(self.project))
    }
}

/// Markdown rendering of aggregated validation problems.
pub struct ValidationReport<'a>(pub &'a ValidationErrors);

impl fmt::Display for ValidationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Validation failed")?;
        writeln!(f)?;
        writeln!(f, "{} problem(s) found:", self.0.len())?;
        writeln!(f)?;
        for issue in self.0 {
            writeln!(f, "- {issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::gateway::IssueDraft;
    use crate::models::{ProjectMeta, RemoteId, Task};
    use crate::reconcile::{OperationError, OperationOutcome, Operation, TaskRef};
    use crate::validation::{IssueKind, ValidationIssue};

    #[test]
    fn test_push_result_lists_failures() {
        let mut target = TaskRef::new(vec![0], &Task::new("Design API"));
        target.remote_id = RemoteId(5);
        let report = ExecutionReport {
            outcomes: vec![
                OperationOutcome {
                    operation: Operation {
                        target: target.clone(),
                        mutation: Mutation::Create {
                            draft: IssueDraft::default(),
                            closed: false,
                        },
                    },
                    result: Ok(()),
                },
                OperationOutcome {
                    operation: Operation {
                        target,
                        mutation: Mutation::AddToProject,
                    },
                    result: Err(OperationError::Remote(RemoteError::Rejected(
                        "project is closed".to_string(),
                    ))),
                },
            ],
            ..Default::default()
        };

        let output = PushResult(&report).to_string();

        assert!(output.contains("**1 applied, 1 failed**"));
        assert!(output.contains("### Created\n\n- #5 \"Design API\""));
        assert!(output.contains("- AddToProject #5 \"Design API\": rejected: project is closed"));
    }

    #[test]
    fn test_push_result_reports_stopped_run() {
        let mut target = TaskRef::new(vec![0], &Task::new("Alpha"));
        target.remote_id = RemoteId(12);
        let report = ExecutionReport {
            outcomes: vec![OperationOutcome {
                operation: Operation {
                    target,
                    mutation: Mutation::AddToProject,
                },
                result: Err(OperationError::Remote(RemoteError::Transport(
                    "connection reset".to_string(),
                ))),
            }],
            aborted: Some(RemoteError::Transport("connection reset".to_string())),
            not_attempted: 2,
            ..Default::default()
        };

        let output = PushResult(&report).to_string();

        assert!(output.contains("**0 applied, 1 failed, 2 not attempted**"));
        assert!(output.contains("Run stopped early: connection reset"));
    }

    #[test]
    fn test_validation_report() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationIssue::new("1", &Task::new(""), IssueKind::EmptyTitle));

        let output = ValidationReport(&errors).to_string();
        assert!(output.contains("1 problem(s) found:"));
    }

    #[test]
    fn test_pull_result_lists_files() {
        let project = Project::new(ProjectMeta::default(), vec![Task::existing(1, "One")]);
        let result = PullResult {
            project: &project,
            files: vec![PathBuf::from("tasks.yaml")],
            bodies: 0,
        };
        let output = result.to_string();
        assert!(output.contains("- wrote `tasks.yaml`"));
        assert!(!output.contains("body file"));
    }
}
