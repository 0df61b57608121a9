use std::fs;

use eyre::{Result, WrapErr, eyre};

use crate::cli::{Cli, DeployArgs, DeploymentsArgs, SyncConfigArgs};
use crate::config::{AppConfig, NetworkConfig};
use crate::contracts::{self, AlloyClient, ContractArtifact, DeployContext, DeploymentStore};
use crate::project::{DEPLOYMENTS_DIR, Project};
use crate::sync::{self, ConfigDocument, DEFAULT_ADDRESS_KEY, DEFAULT_CONFIG_FILE};

/// Deploy the selected contract preset to the selected network
pub async fn deploy(cli: &Cli, args: &DeployArgs) -> Result<()> {
    let project = Project::open(&cli.project, cli.project_type.as_deref())?;
    tracing::info!("Using {} project {}", project.project_type, project.name);

    let config = AppConfig::load(cli.config.as_deref(), &project.root)?;
    if let Some(path) = config.config_path() {
        tracing::debug!("Config file: {:?}", path);
    }

    let (network_name, network) = resolve_network(&config, &project, args.network.as_deref())?;
    let (label, contract) = config.get_contract(args.contract.as_deref())?;
    let plan = contract.plan(label);

    let artifact = ContractArtifact::load(&project, &plan.contract_name)?;
    tracing::debug!("Loaded artifact {:?}", artifact.path);

    let private_key = config.resolve_wallet_key(args.wallet.as_deref())?;
    let client = AlloyClient::connect(&network.rpc_url, private_key, network.chain_id).await?;

    let context = DeployContext {
        network: network_name,
        confirmations: args.confirmations.unwrap_or_else(|| network.confirmations()),
    };
    let store = DeploymentStore::new(&project.deployments_dir);

    let outcome = contracts::deploy(&client, &artifact, &plan, &context, &store).await?;
    let address = &outcome.record.contract_address;

    println!("Contract address: {}", address);
    println!("Transaction: {}", outcome.tx_hash);
    println!("Record: {}", outcome.record_path.display());
    if let Some(line) = explorer_line(&network, address) {
        println!("{}", line);
    }

    let config_key = contract.config_key.as_deref().unwrap_or(DEFAULT_ADDRESS_KEY);
    if args.sync {
        let file = args
            .config_file
            .clone()
            .unwrap_or_else(|| project.root.join(DEFAULT_CONFIG_FILE));
        let synced = sync::sync_contract_address(&file, config_key, Some(address.as_str()))
            .wrap_err("Deployment succeeded but the frontend config was not updated")?;
        println!("{}", sync_summary(&synced, address));
    } else {
        println!();
        println!("To update frontend config, run:");
        println!("ballotctl sync-config {} --key {}", address, config_key);
    }

    Ok(())
}

/// Network from the tool config, or a named endpoint from the project itself
fn resolve_network(
    config: &AppConfig,
    project: &Project,
    name: Option<&str>,
) -> Result<(String, NetworkConfig)> {
    match config.get_network(name) {
        Ok((name, network)) => Ok((name.clone(), network.clone())),
        Err(err) => {
            let Some(name) = name else {
                return Err(err);
            };
            let rpc_url = project.rpc_endpoints.get(name).ok_or(err)?;
            tracing::info!("Using rpc endpoint '{}' from {} project", name, project.project_type);
            Ok((
                name.to_string(),
                NetworkConfig {
                    rpc_url: rpc_url.clone(),
                    ..Default::default()
                },
            ))
        }
    }
}

/// Write an address into the frontend config, or print the current value
pub fn sync_config(cli: &Cli, args: &SyncConfigArgs) -> Result<()> {
    let path = args
        .file
        .clone()
        .unwrap_or_else(|| cli.project.join(DEFAULT_CONFIG_FILE));

    if args.show {
        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {:?}", path))?;
        let doc = ConfigDocument::parse(text)?;
        println!("{}", doc.get_string(&args.key)?);
        return Ok(());
    }

    let outcome = sync::sync_contract_address(&path, &args.key, args.address.as_deref())?;
    if let Some(address) = args.address.as_deref() {
        println!("{}", sync_summary(&outcome, address));
    }
    Ok(())
}

fn explorer_line(network: &NetworkConfig, address: &str) -> Option<String> {
    network
        .explorer_link(address)
        .map(|link| format!("Explorer: {}", link))
}

fn sync_summary(outcome: &sync::SyncOutcome, address: &str) -> String {
    if outcome.changed {
        format!(
            "Updated {} address: {} -> {}\nConfig file: {}",
            outcome.key,
            outcome.previous,
            address,
            outcome.path.display()
        )
    } else {
        format!("{} already set to {}", outcome.key, address)
    }
}

/// List deployment records under `<project>/deployments`
pub fn deployments(cli: &Cli, args: &DeploymentsArgs) -> Result<()> {
    let store = DeploymentStore::new(cli.project.join(DEPLOYMENTS_DIR));

    if let (Some(network), Some(label)) = (&args.network, &args.contract) {
        let record = store.load(network, label)?.ok_or_else(|| {
            eyre!(
                "No deployment recorded at {:?}",
                store.record_path(network, label)
            )
        })?;
        println!("{}", record.contract_address);
        return Ok(());
    }

    let found: Vec<_> = store
        .scan()?
        .into_iter()
        .filter(|d| args.network.as_ref().is_none_or(|n| &d.record.network == n))
        .filter(|d| args.contract.as_ref().is_none_or(|l| &d.label == l))
        .collect();

    if found.is_empty() {
        println!("No deployments found in {}", store.dir().display());
        return Ok(());
    }

    for d in found {
        println!(
            "{:<12} {:<16} {}  block {:<8} {}",
            d.record.network,
            d.label,
            d.record.contract_address,
            d.record.block_number,
            d.record.deployed_at
        );
        tracing::debug!("  from {:?}", d.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::project::ProjectType;

    fn project_with_endpoints(endpoints: &[(&str, &str)]) -> Project {
        Project {
            project_type: ProjectType::Foundry,
            root: PathBuf::from("/tmp/voting"),
            name: "voting".to_string(),
            artifacts_dir: PathBuf::from("/tmp/voting/out"),
            deployments_dir: PathBuf::from("/tmp/voting/deployments"),
            rpc_endpoints: endpoints
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    /// Presets only, independent of any user config on the machine
    fn empty_config() -> AppConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ballotctl.toml");
        fs::write(&path, "").unwrap();
        AppConfig::load(Some(&path), dir.path()).unwrap()
    }

    #[test]
    fn test_explorer_line_is_explorer_neutral() {
        let network = NetworkConfig {
            rpc_url: "https://rpc.gnosischain.com".to_string(),
            explorer_url: Some("https://gnosisscan.io/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            explorer_line(&network, "0x1234567890123456789012345678901234567890").as_deref(),
            Some("Explorer: https://gnosisscan.io/address/0x1234567890123456789012345678901234567890")
        );
        assert!(explorer_line(&NetworkConfig::default(), "0x00").is_none());
    }

    #[test]
    fn test_sync_summary_shows_previous_address() {
        let mut outcome = sync::SyncOutcome {
            path: PathBuf::from("frontend/public/config.js"),
            key: "CONTRACTS.PRIVATE_VOTING".to_string(),
            previous: "0xF8976BA463c31f4A0fbD6948Da43a77e74EE4196".to_string(),
            changed: true,
        };
        let address = "0x1234567890123456789012345678901234567890";

        assert_eq!(
            sync_summary(&outcome, address),
            "Updated CONTRACTS.PRIVATE_VOTING address: \
             0xF8976BA463c31f4A0fbD6948Da43a77e74EE4196 -> \
             0x1234567890123456789012345678901234567890\n\
             Config file: frontend/public/config.js"
        );

        outcome.changed = false;
        assert_eq!(
            sync_summary(&outcome, address),
            "CONTRACTS.PRIVATE_VOTING already set to 0x1234567890123456789012345678901234567890"
        );
    }

    #[test]
    fn test_resolve_network_defaults_to_localhost() {
        let config = empty_config();
        let (name, network) = resolve_network(&config, &project_with_endpoints(&[]), None).unwrap();
        assert_eq!(name, "localhost");
        assert_eq!(network.chain_id, Some(31337));
    }

    #[test]
    fn test_resolve_network_falls_back_to_project_endpoint() {
        let config = empty_config();
        let project = project_with_endpoints(&[("holesky", "https://holesky.example")]);

        let (name, network) = resolve_network(&config, &project, Some("holesky")).unwrap();
        assert_eq!(name, "holesky");
        assert_eq!(network.rpc_url, "https://holesky.example");
        assert!(network.chain_id.is_none());

        assert!(resolve_network(&config, &project, Some("mainnet")).is_err());
    }
}
