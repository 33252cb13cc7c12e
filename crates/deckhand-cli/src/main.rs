//! Deckhand CLI - converge declared resources onto a platform.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::deploy::{DeployArgs, Operation};

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Reconcile resource descriptors against a container platform")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update resources in a namespace or group
    Deploy(DeployArgs),

    /// Remove resources from a namespace or group
    Delete(DeployArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "deckhand=debug" } else { "deckhand=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result: Result<(), anyhow::Error> = match cli.command {
        Commands::Deploy(args) => commands::deploy::run(Operation::Deploy, args)
            .await
            .map_err(Into::into),
        Commands::Delete(args) => commands::deploy::run(Operation::Delete, args)
            .await
            .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
