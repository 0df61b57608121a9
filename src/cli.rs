use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sync::DEFAULT_ADDRESS_KEY;

#[derive(Parser, Debug)]
#[command(name = "ballotctl")]
#[command(about = "Deploy voting contracts and point the frontend config at them")]
#[command(version)]
pub struct Cli {
    /// Path to the project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Config file to use instead of ballotctl.toml / the user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip project detection and force a specific project type
    #[arg(long, global = true, value_parser = ["foundry", "hardhat"])]
    pub project_type: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a contract and record the deployment
    Deploy(DeployArgs),

    /// Write a contract address into the frontend config
    SyncConfig(SyncConfigArgs),

    /// List recorded deployments
    Deployments(DeploymentsArgs),
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Network to deploy to
    #[arg(short, long, env = "BALLOTCTL_NETWORK")]
    pub network: Option<String>,

    /// Wallet to sign with
    #[arg(short, long)]
    pub wallet: Option<String>,

    /// Contract preset label, e.g. private-voting or public-voting
    #[arg(short, long)]
    pub contract: Option<String>,

    /// Confirmations to wait for, overriding the network setting
    #[arg(long)]
    pub confirmations: Option<u64>,

    /// Update the frontend config with the new address after deploying
    #[arg(long)]
    pub sync: bool,

    /// Frontend config to update with --sync
    #[arg(long, requires = "sync")]
    pub config_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SyncConfigArgs {
    /// Deployed contract address (0x followed by 40 hex characters)
    pub address: Option<String>,

    /// Frontend config file [default: <project>/frontend/public/config.js]
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Property to update, as a dotted path or a bare name
    #[arg(short, long, default_value = DEFAULT_ADDRESS_KEY)]
    pub key: String,

    /// Print the current value instead of writing
    #[arg(long, conflicts_with = "address")]
    pub show: bool,
}

#[derive(Args, Debug)]
pub struct DeploymentsArgs {
    /// Only show deployments on this network
    #[arg(short, long)]
    pub network: Option<String>,

    /// Only show deployments with this label
    #[arg(short, long)]
    pub contract: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "ballotctl",
            "-C",
            "contracts",
            "deploy",
            "--network",
            "sepolia",
            "--contract",
            "public-voting",
            "--sync",
        ])
        .unwrap();

        assert_eq!(cli.project, PathBuf::from("contracts"));
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.network.as_deref(), Some("sepolia"));
        assert_eq!(args.contract.as_deref(), Some("public-voting"));
        assert!(args.sync);
    }

    #[test]
    fn test_sync_config_address_is_optional() {
        let cli = Cli::try_parse_from(["ballotctl", "sync-config"]).unwrap();
        let Command::SyncConfig(args) = cli.command else {
            panic!("expected sync-config");
        };
        assert!(args.address.is_none());
        assert_eq!(args.key, DEFAULT_ADDRESS_KEY);
    }

    #[test]
    fn test_config_file_requires_sync() {
        assert!(
            Cli::try_parse_from(["ballotctl", "deploy", "--config-file", "config.js"]).is_err()
        );
    }
}
