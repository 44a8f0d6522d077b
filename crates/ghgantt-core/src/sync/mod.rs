//! High-level synchronizer API.
//!
//! [`Synchronizer`] ties a loaded [`Config`] to a remote gateway and exposes
//! the user-facing runs as async methods. The engine underneath is blocking
//! and single-threaded: every method hands its whole run to
//! `tokio::task::spawn_blocking`, and operations inside a run are executed
//! one after another.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Synchronizer │───▶│   engine     │───▶│ RemoteGateway│
//! │   (async)    │    │  (blocking)  │    │ GitHub / mem │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                            │
//!                            ▼
//!                     working file, xlsx,
//!                     chart, issues/*.md
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use ghgantt_core::{params::PushParams, SynchronizerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let synchronizer = SynchronizerBuilder::new()
//!     .with_config_path(Some("config.yaml"))
//!     .with_token(std::env::var("GITHUB_TOKEN").ok())
//!     .build()
//!     .await?;
//!
//! let pulled = synchronizer.pull().await?;
//! println!("{} tasks", pulled.project.total_tasks());
//!
//! let preview = synchronizer
//!     .push(&PushParams { dry_run: true, ..Default::default() })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod engine;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::task;

pub use builder::SynchronizerBuilder;
pub use engine::{PullOutcome, PushOutcome, ValidateOutcome, ViewOutcome};

use crate::config::{Artifacts, Config};
use crate::error::{Result, SyncError};
use crate::gateway::{GithubGateway, RemoteGateway};
use crate::params::{InitParams, PushParams, ValidateParams, ViewParams};
use crate::reconcile::MutationPlan;

/// A gateway shared with the blocking worker threads.
type SharedGateway = Arc<Mutex<Box<dyn RemoteGateway + Send>>>;

/// Where a run gets its gateway from.
#[derive(Clone)]
pub(crate) enum GatewaySource {
    /// A new GitHub gateway per run, built on the worker thread
    Github {
        token: Option<String>,
        api_url: Option<String>,
    },

    /// A gateway supplied by the caller
    Shared(SharedGateway),
}

impl GatewaySource {
    /// Runs `f` with a gateway. Must be called on a blocking thread: the
    /// GitHub gateway owns a blocking HTTP client.
    fn with_gateway<T>(
        &self,
        config: &Config,
        f: impl FnOnce(&mut dyn RemoteGateway) -> Result<T>,
    ) -> Result<T> {
        match self {
            GatewaySource::Github { token, api_url } => {
                let token = token.clone().ok_or_else(|| SyncError::Configuration {
                    message: "A GitHub token is required: pass --token or set GITHUB_TOKEN"
                        .to_string(),
                })?;
                let mut gateway = GithubGateway::new(config, token)?;
                if let Some(api_url) = api_url {
                    gateway = gateway.with_api_url(api_url.clone());
                }
                f(&mut gateway)
            }
            GatewaySource::Shared(shared) => {
                let mut guard = shared.lock().map_err(|_| SyncError::Configuration {
                    message: "Gateway lock poisoned".to_string(),
                })?;
                f(&mut **guard)
            }
        }
    }
}

/// Runs a blocking closure on the worker pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Configuration {
            message: format!("Task join error: {e}"),
        })?
}

fn today() -> jiff::civil::Date {
    jiff::Zoned::now().date()
}

/// Writes a fresh `config.yaml` into `params.directory`.
pub async fn init(params: &InitParams) -> Result<PathBuf> {
    let params = params.clone();
    run_blocking(move || engine::init(&params)).await
}

/// Main interface for pulling, pushing and viewing a Project.
pub struct Synchronizer {
    config: Config,
    config_path: PathBuf,
    gateway: GatewaySource,
}

impl Synchronizer {
    pub(crate) fn new(config: Config, config_path: PathBuf, gateway: GatewaySource) -> Self {
        Self {
            config,
            config_path,
            gateway,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Artifact locations, relative to the directory of the config file.
    pub fn artifacts(&self) -> Artifacts {
        let base_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.config.artifacts(&base_dir)
    }

    /// Fetches the Project and writes every artifact.
    pub async fn pull(&self) -> Result<PullOutcome> {
        let config = self.config.clone();
        let artifacts = self.artifacts();
        let gateway = self.gateway.clone();
        let today = today();

        run_blocking(move || {
            gateway.with_gateway(&config, |remote| {
                engine::pull(remote, &config, &artifacts, today)
            })
        })
        .await
    }

    /// Reconciles the working file into the Project.
    pub async fn push(&self, params: &PushParams) -> Result<PushOutcome> {
        let config = self.config.clone();
        let artifacts = self.artifacts();
        let gateway = self.gateway.clone();
        let params = *params;

        run_blocking(move || {
            gateway.with_gateway(&config, |remote| engine::push(remote, &artifacts, &params))
        })
        .await
    }

    /// The plan a push would execute right now.
    pub async fn status(&self) -> Result<MutationPlan> {
        let params = PushParams {
            dry_run: true,
            ..Default::default()
        };
        match self.push(&params).await? {
            PushOutcome::Planned(plan) => Ok(plan),
            PushOutcome::Executed(_) => Err(SyncError::Configuration {
                message: "Status run executed operations".to_string(),
            }),
        }
    }

    /// Renders the working file without contacting the remote.
    pub async fn view(&self, params: &ViewParams) -> Result<ViewOutcome> {
        let artifacts = self.artifacts();
        let params = params.clone();
        let today = today();

        run_blocking(move || engine::view(&artifacts, &params, today)).await
    }

    /// Validates the working file, and the remote Project when asked.
    pub async fn validate(&self, params: &ValidateParams) -> Result<ValidateOutcome> {
        let config = self.config.clone();
        let artifacts = self.artifacts();
        let gateway = self.gateway.clone();
        let remote = params.remote;

        run_blocking(move || {
            if remote {
                gateway.with_gateway(&config, |checked| engine::validate(&artifacts, Some(checked)))
            } else {
                engine::validate(&artifacts, None)
            }
        })
        .await
    }
}
