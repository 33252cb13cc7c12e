//! Implementation of the `deckhand deploy` and `deckhand delete` commands.

use std::path::PathBuf;

use clap::Args;
use deckhand_engine::{
    DeploymentCoordinator, DeploymentReport, DeploymentRequest, EngineConfig, EngineError,
    Strategy,
};
use thiserror::Error;
use tracing::info;

use super::manifest::{self, ManifestError};

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Which direction to reconcile in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deploy,
    Delete,
}

/// Arguments shared by the deploy and delete commands.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Descriptor file or directory (repeatable)
    #[arg(short = 'f', long = "file", value_name = "PATH", required = true)]
    pub files: Vec<PathBuf>,

    /// Namespace or group (overrides deckhand.toml)
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Deployment strategy: replace, update or reset
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Platform API base URL (overrides deckhand.toml)
    #[arg(long)]
    pub url: Option<String>,

    /// Configuration file to read instead of ./deckhand.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl DeployArgs {
    /// Load configuration and fold command-line overrides into it.
    fn resolve_config(&self) -> Result<EngineConfig, EngineError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::load()?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut EngineConfig) {
        if let Some(scope) = &self.scope {
            config.deployment.scope.clone_from(scope);
        }
        if let Some(strategy) = self.strategy {
            config.deployment.strategy = strategy;
        }
        if let Some(url) = &self.url {
            config.platform.url.clone_from(url);
        }
    }
}

pub async fn run(operation: Operation, args: DeployArgs) -> Result<(), DeployError> {
    let config = args.resolve_config()?;
    let descriptors = manifest::load(&args.files)?;
    let coordinator = DeploymentCoordinator::from_config(&config)?;

    info!(
        platform = %config.platform.kind,
        url = %config.platform.url,
        descriptors = descriptors.len(),
        "loaded descriptors"
    );

    let request = DeploymentRequest::new(
        config.deployment.scope,
        config.deployment.strategy,
        descriptors,
    );
    let report = match operation {
        Operation::Deploy => coordinator.deploy(request).await?,
        Operation::Delete => coordinator.delete(request).await?,
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &DeploymentReport) {
    if report.is_empty() {
        println!("Nothing to do ({} strategy).", report.strategy);
        return;
    }
    println!("{report}");
}
