//! Blocking pull, push, view and validate runs.
//!
//! Each function takes the gateway as `&mut dyn RemoteGateway`, so the same
//! code runs against GitHub or an [`InMemoryGateway`](crate::gateway::InMemoryGateway).

use std::path::{Path, PathBuf};

use jiff::civil::Date;

use crate::config::{Artifacts, Config, DateFields, CONFIG_FILE_NAME};
use crate::error::{IoResultExt, Result, SyncError};
use crate::formats::{self, bodies, spreadsheet, yaml};
use crate::gantt::{self, mermaid, table, ScheduleOptions};
use crate::gateway::{AccessReport, RemoteGateway};
use crate::models::{FetchFilter, Project};
use crate::params::{InitParams, PushParams, ViewParams};
use crate::progress;
use crate::reconcile::{self, ExecutionReport, MutationPlan};
use crate::validation::ValidationErrors;

/// What a pull produced.
#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub project: Project,

    /// Working file encodings and chart document, in write order
    pub files: Vec<PathBuf>,

    /// Number of body files written
    pub bodies: usize,
}

/// What a push did.
#[derive(Debug, Clone)]
pub enum PushOutcome {
    /// Dry run: the plan that would have been executed
    Planned(MutationPlan),

    Executed(ExecutionReport),
}

impl PushOutcome {
    /// Whether nothing failed. A dry run always succeeds.
    pub fn is_success(&self) -> bool {
        match self {
            PushOutcome::Planned(_) => true,
            PushOutcome::Executed(report) => report.is_success(),
        }
    }
}

/// Rendered view and where it was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutcome {
    pub content: String,
    pub saved_to: Option<PathBuf>,
}

/// Result of validating the working file.
#[derive(Debug, Clone)]
pub struct ValidateOutcome {
    /// Tasks in the file when it is valid
    pub tasks: usize,

    /// Every problem found; `None` when the file is valid
    pub problems: Option<ValidationErrors>,

    /// Remote check, when requested
    pub access: Option<AccessReport>,
}

impl ValidateOutcome {
    pub fn is_valid(&self) -> bool {
        self.problems.is_none()
            && self
                .access
                .as_ref()
                .map_or(true, |access| access.missing_fields().is_empty())
    }
}

/// Writes a new `config.yaml` and returns its path.
pub fn init(params: &InitParams) -> Result<PathBuf> {
    let path = params.directory.join(CONFIG_FILE_NAME);
    if path.exists() && !params.force {
        return Err(SyncError::invalid_input("config")
            .with_reason(format!("{} already exists; use --force to replace it", path.display())));
    }

    let mut config = Config::new(params.repo.clone(), params.project_number);
    if let Some(output_file) = &params.output_file {
        config.output_file = output_file.clone();
    }
    let defaults = DateFields::default();
    config.date_fields = DateFields {
        start: params.start_field.clone().unwrap_or(defaults.start),
        end: params.end_field.clone().unwrap_or(defaults.end),
    };
    let config = config.normalized()?;

    std::fs::create_dir_all(&params.directory).at_path(&params.directory)?;
    config.save(&path)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Fetches the filtered Project and writes every artifact.
pub fn pull(
    gateway: &mut dyn RemoteGateway,
    config: &Config,
    artifacts: &Artifacts,
    today: Date,
) -> Result<PullOutcome> {
    let mut project = gateway.fetch_project(&FetchFilter::from(config))?;
    progress::recompute(&mut project);

    yaml::save(&artifacts.yaml, &project)?;
    spreadsheet::save(&artifacts.spreadsheet, &project)?;
    let chart = mermaid::render(&gantt::schedule(&project, &ScheduleOptions::default()));
    mermaid::save_document(&artifacts.gantt, &chart, today)?;
    let bodies = bodies::save_all(&project.tasks, &artifacts.issues_dir)?;

    log::info!(
        "Pulled {} tasks from '{}'",
        project.total_tasks(),
        project.meta.title
    );
    Ok(PullOutcome {
        project,
        files: vec![
            artifacts.yaml.clone(),
            artifacts.spreadsheet.clone(),
            artifacts.gantt.clone(),
        ],
        bodies,
    })
}

/// Reads the working file and the body files next to it.
pub fn load_local(artifacts: &Artifacts) -> Result<Project> {
    let mut project = formats::load_project(&artifacts.working_file)?;
    let loaded = bodies::load_all(&mut project.tasks, &artifacts.issues_dir)?;
    log::debug!("Loaded {loaded} body files");
    Ok(project)
}

/// Diffs the working file against the live Project and, unless this is a
/// dry run, applies the plan and writes the working file back.
///
/// Nothing is sent to the remote while the working file is invalid. When a
/// transport failure stops execution, identifiers assigned so far are still
/// written back and the report carries the failure in
/// [`ExecutionReport::aborted`].
pub fn push(
    gateway: &mut dyn RemoteGateway,
    artifacts: &Artifacts,
    params: &PushParams,
) -> Result<PushOutcome> {
    let mut local = load_local(artifacts)?;
    let remote = gateway.fetch_project(&FetchFilter::everything())?;
    let plan = reconcile::plan(&local, &remote, params.options());

    if params.dry_run {
        return Ok(PushOutcome::Planned(plan));
    }
    if plan.is_empty() {
        log::info!("Nothing to push");
        return Ok(PushOutcome::Executed(ExecutionReport {
            diagnostics: plan.diagnostics,
            ..Default::default()
        }));
    }

    let report = reconcile::execute(plan, &mut local, gateway);
    progress::recompute(&mut local);
    formats::save_project(&artifacts.working_file, &local)?;

    if let Some(error) = &report.aborted {
        log::warn!("Push stopped early ({report}): {error}");
    }
    Ok(PushOutcome::Executed(report))
}

/// Renders the working file.
pub fn view(artifacts: &Artifacts, params: &ViewParams, today: Date) -> Result<ViewOutcome> {
    let project = formats::load_project(&artifacts.working_file)?;
    let content = match params.format.group_by() {
        Some(group_by) => mermaid::render(&gantt::schedule(
            &project,
            &ScheduleOptions {
                group_by,
                exclude_weekends: params.exclude_weekends,
            },
        )),
        None => table::render(&project),
    };

    let saved_to = match &params.output {
        Some(path) => {
            save_view(path, &content, params.format.group_by().is_some(), today)?;
            Some(path.clone())
        }
        None => None,
    };
    Ok(ViewOutcome { content, saved_to })
}

fn save_view(path: &Path, content: &str, chart: bool, today: Date) -> Result<()> {
    if chart {
        return mermaid::save_document(path, content, today);
    }
    std::fs::write(path, content).at_path(path)
}

/// Validates the working file and, with a gateway, the remote Project.
pub fn validate(
    artifacts: &Artifacts,
    gateway: Option<&mut dyn RemoteGateway>,
) -> Result<ValidateOutcome> {
    let (tasks, problems) = match formats::load_project(&artifacts.working_file) {
        Ok(project) => (project.total_tasks(), None),
        Err(SyncError::Validation(errors)) => (0, Some(errors)),
        Err(error) => return Err(error),
    };

    let access = match gateway {
        Some(gateway) => Some(gateway.check_access()?),
        None => None,
    };
    Ok(ValidateOutcome {
        tasks,
        problems,
        access,
    })
}
