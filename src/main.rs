use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classr::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classr=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { model, port, host } => {
            classr::cli::serve(model, port, host).await?;
        }
        Commands::Classify { model, texts } => {
            classr::cli::classify(model, texts).await?;
        }
        Commands::Info { model } => {
            classr::cli::info(model).await?;
        }
        Commands::Pull {
            repo,
            output,
            weights,
        } => {
            classr::cli::pull(repo, output, weights).await?;
        }
    }

    Ok(())
}
