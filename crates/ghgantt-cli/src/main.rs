//! ghgantt command-line application.

mod args;
mod cli;
mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use ghgantt_core::SynchronizerBuilder;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        config,
        token,
        api_url,
        no_color,
        command,
    } = Args::parse();
    let renderer = TerminalRenderer::new(!no_color);

    match command {
        Init(args) => cli::init(&args.into(), &renderer).await,
        Pull => connect(config, token, api_url, renderer).await?.pull().await,
        Push(args) => {
            connect(config, token, api_url, renderer)
                .await?
                .push(&args.into())
                .await
        }
        Status => connect(config, token, api_url, renderer).await?.status().await,
        View(args) => {
            connect(config, token, api_url, renderer)
                .await?
                .view(&args.into())
                .await
        }
        Validate(args) => {
            connect(config, token, api_url, renderer)
                .await?
                .validate(&args.into())
                .await
        }
    }
}

/// Loads the configuration and wraps the synchronizer in a [`Cli`].
async fn connect(
    config: Option<PathBuf>,
    token: Option<String>,
    api_url: Option<String>,
    renderer: TerminalRenderer,
) -> Result<Cli> {
    let synchronizer = SynchronizerBuilder::new()
        .with_config_path(config)
        .with_token(token)
        .with_api_url(api_url)
        .build()
        .await
        .context("Failed to load configuration")?;

    info!("ghgantt started for {}", synchronizer.config().repo);
    Ok(Cli::new(synchronizer, renderer))
}
