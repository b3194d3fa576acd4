mod auth;
mod cli;
mod engine;
mod error;
mod models;
mod providers;
mod query;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting DeployLens - Deployment History Insights");
    cli.execute().await?;

    Ok(())
}
