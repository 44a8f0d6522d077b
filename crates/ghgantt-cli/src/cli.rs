//! Command handlers.
//!
//! Each handler runs one core operation and renders its markdown result.
//! Failures that should end the process with a non-zero status are returned
//! as errors after the report has been printed.

use anyhow::{bail, Context, Result};
use ghgantt_core::display::{
    AccessSummary, ChangeList, Diagnostics, OperationStatus, PullResult, PushResult,
    ValidationReport,
};
use ghgantt_core::params::{InitParams, PushParams, ValidateParams, ViewParams};
use ghgantt_core::{PushOutcome, Synchronizer};

use crate::renderer::TerminalRenderer;

/// Writes a config file. Runs without a [`Synchronizer`], since there is no
/// configuration to load yet.
pub async fn init(params: &InitParams, renderer: &TerminalRenderer) -> Result<()> {
    let path = ghgantt_core::sync::init(params)
        .await
        .context("Failed to write configuration")?;
    let status = OperationStatus::success(format!(
        "Wrote {}. Run `ghgantt pull` to fetch the project.",
        path.display()
    ));
    renderer.render(&status.to_string())
}

pub struct Cli {
    synchronizer: Synchronizer,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(synchronizer: Synchronizer, renderer: TerminalRenderer) -> Self {
        Self {
            synchronizer,
            renderer,
        }
    }

    pub async fn pull(&self) -> Result<()> {
        let outcome = self
            .synchronizer
            .pull()
            .await
            .context("Failed to pull project")?;

        let result = PullResult {
            project: &outcome.project,
            files: outcome.files.clone(),
            bodies: outcome.bodies,
        };
        self.renderer.render(&result.to_string())
    }

    pub async fn push(&self, params: &PushParams) -> Result<()> {
        let outcome = self
            .synchronizer
            .push(params)
            .await
            .context("Failed to push changes")?;

        match &outcome {
            PushOutcome::Planned(plan) => {
                self.renderer.render(&ChangeList(plan).to_string())?;
                if !plan.is_empty() {
                    self.renderer.render("\n_Dry run: nothing was sent._\n")?;
                }
            }
            PushOutcome::Executed(report) if report.outcomes.is_empty() => {
                self.renderer.render(
                    &OperationStatus::success("Nothing to push. The project is up to date.")
                        .to_string(),
                )?;
                self.renderer
                    .render(&Diagnostics(&report.diagnostics).to_string())?;
            }
            PushOutcome::Executed(report) => {
                self.renderer.render(&PushResult(report).to_string())?;
                if let Some(error) = &report.aborted {
                    bail!("Push stopped early ({report}): {error}");
                }
                if !report.is_success() {
                    bail!("{} operation(s) failed", report.failed());
                }
            }
        }
        Ok(())
    }

    pub async fn status(&self) -> Result<()> {
        let plan = self
            .synchronizer
            .status()
            .await
            .context("Failed to compute changes")?;
        self.renderer.render(&ChangeList(&plan).to_string())
    }

    pub async fn view(&self, params: &ViewParams) -> Result<()> {
        let outcome = self
            .synchronizer
            .view(params)
            .await
            .context("Failed to render working file")?;

        self.renderer.render(&format!("{}\n", outcome.content.trim_end()))?;
        if let Some(path) = &outcome.saved_to {
            let status = OperationStatus::success(format!("Saved to {}", path.display()));
            self.renderer.render(&format!("\n{status}"))?;
        }
        Ok(())
    }

    pub async fn validate(&self, params: &ValidateParams) -> Result<()> {
        let outcome = self
            .synchronizer
            .validate(params)
            .await
            .context("Failed to validate")?;

        match &outcome.problems {
            Some(problems) => self.renderer.render(&ValidationReport(problems).to_string())?,
            None => self.renderer.render(
                &OperationStatus::success(format!(
                    "{} is valid ({} tasks)",
                    self.synchronizer.config().output_file,
                    outcome.tasks
                ))
                .to_string(),
            )?,
        }
        if let Some(access) = &outcome.access {
            self.renderer.render(&AccessSummary(access).to_string())?;
        }

        if !outcome.is_valid() {
            bail!("Validation failed");
        }
        Ok(())
    }
}
