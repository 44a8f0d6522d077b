//! Builder for creating and configuring Synchronizer instances.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::task;

use super::{GatewaySource, Synchronizer};
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{IoResultExt, Result, SyncError};
use crate::gateway::RemoteGateway;

/// Builder for [`Synchronizer`].
#[derive(Default)]
pub struct SynchronizerBuilder {
    config_path: Option<PathBuf>,
    token: Option<String>,
    api_url: Option<String>,
    gateway: Option<Box<dyn RemoteGateway + Send>>,
}

impl SynchronizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses this configuration file instead of searching for one.
    ///
    /// If not specified, `config.yaml` is searched for in the current
    /// directory and its parents.
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.config_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// GitHub token for remote runs.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|token| !token.trim().is_empty());
        self
    }

    /// API root for GitHub Enterprise installations.
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        self.api_url = api_url;
        self
    }

    /// Replaces the GitHub gateway, e.g. with an
    /// [`InMemoryGateway`](crate::gateway::InMemoryGateway).
    pub fn with_gateway(mut self, gateway: impl RemoteGateway + Send + 'static) -> Self {
        self.gateway = Some(Box::new(gateway));
        self
    }

    /// Locates and loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if no configuration file is found,
    /// and the loader's error if the file is malformed.
    pub async fn build(self) -> Result<Synchronizer> {
        let config_path = match self.config_path {
            Some(path) => path,
            None => Self::discover_config()?,
        };

        let path = config_path.clone();
        let config = task::spawn_blocking(move || Config::load(&path))
            .await
            .map_err(|e| SyncError::Configuration {
                message: format!("Task join error: {e}"),
            })??;
        log::debug!("Using configuration {}", config_path.display());

        let gateway = match self.gateway {
            Some(gateway) => GatewaySource::Shared(Arc::new(Mutex::new(gateway))),
            None => GatewaySource::Github {
                token: self.token,
                api_url: self.api_url,
            },
        };
        Ok(Synchronizer::new(config, config_path, gateway))
    }

    fn discover_config() -> Result<PathBuf> {
        let cwd = std::env::current_dir().at_path(".")?;
        Config::discover(&cwd).ok_or_else(|| SyncError::Configuration {
            message: format!(
                "No {CONFIG_FILE_NAME} found in {} or its parents; run `ghgantt init` first",
                cwd.display()
            ),
        })
    }
}
