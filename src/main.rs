mod cli;
mod commands;
mod config;
mod contracts;
mod project;
mod sync;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut cli = Cli::parse();
    cli.project = cli.project.canonicalize().unwrap_or(cli.project);

    match &cli.command {
        Command::Deploy(args) => commands::deploy(&cli, args).await,
        Command::SyncConfig(args) => commands::sync_config(&cli, args),
        Command::Deployments(args) => commands::deployments(&cli, args),
    }
}
