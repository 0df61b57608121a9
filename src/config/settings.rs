use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::KeychainManager;
use crate::contracts::{DEFAULT_CONFIRMATIONS, DeploymentPlan, InitCall};

const CONFIG_DIR: &str = "ballotctl";
const CONFIG_FILE: &str = "config.toml";

/// Per-project config file, looked up in the project root
pub const PROJECT_CONFIG_FILE: &str = "ballotctl.toml";

/// Environment variable holding the deployer key when no wallet is configured
pub const DEFAULT_KEY_ENV_VAR: &str = "DEPLOYER_PRIVATE_KEY";

pub const FALLBACK_NETWORK: &str = "localhost";
pub const FALLBACK_CONTRACT: &str = "private-voting";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub wallets: HashMap<String, WalletConfig>,

    #[serde(default)]
    pub contracts: HashMap<String, ContractConfig>,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    pub explorer_url: Option<String>,
    /// Confirmations to wait for after deployment
    pub confirmations: Option<u64>,
}

impl NetworkConfig {
    pub fn confirmations(&self) -> u64 {
        self.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS)
    }

    /// Block explorer page for an address, if the network has an explorer
    pub fn explorer_link(&self, address: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|url| format!("{}/address/{}", url.trim_end_matches('/'), address))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Reference to keychain entry (e.g., "ballotctl:deployer")
    pub keychain: Option<String>,
    /// Environment variable containing private key
    pub env_var: Option<String>,
    /// Optional label for display
    pub label: Option<String>,
}

/// A deployable contract and how to initialize it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Contract name in the build artifacts
    pub name: String,
    /// Frontend config property that holds this contract's address
    pub config_key: Option<String>,
    #[serde(default)]
    pub constructor_args: Vec<String>,
    #[serde(default)]
    pub seed: Vec<InitCall>,
}

impl ContractConfig {
    pub fn plan(&self, label: &str) -> DeploymentPlan {
        DeploymentPlan {
            label: label.to_string(),
            contract_name: self.name.clone(),
            constructor_args: self.constructor_args.clone(),
            seed: self.seed.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
    pub wallet: Option<String>,
    pub contract: Option<String>,
}

impl AppConfig {
    /// Load configuration and merge in the built-in presets.
    ///
    /// Lookup order: `explicit` path, `<project_root>/ballotctl.toml`, the user
    /// config dir, then presets only.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::load_from(path)?
        } else {
            let project_config = project_root.join(PROJECT_CONFIG_FILE);
            let user_config = Self::default_config_path().ok().filter(|p| p.exists());

            if project_config.exists() {
                Self::load_from(&project_config)?
            } else if let Some(path) = user_config {
                Self::load_from(&path)?
            } else {
                tracing::debug!("No config file found, using built-in presets");
                Self::default()
            }
        };

        config.merge_presets(builtin_presets());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: AppConfig = toml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::info!("Loaded config from {:?}", path);
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Entries from `presets` fill in anything the user did not define
    fn merge_presets(&mut self, presets: AppConfig) {
        for (name, network) in presets.networks {
            self.networks.entry(name).or_insert(network);
        }
        for (name, wallet) in presets.wallets {
            self.wallets.entry(name).or_insert(wallet);
        }
        for (label, contract) in presets.contracts {
            self.contracts.entry(label).or_insert(contract);
        }
    }

    fn default_network(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.network.as_deref())
            .unwrap_or(FALLBACK_NETWORK)
    }

    fn default_contract(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.contract.as_deref())
            .unwrap_or(FALLBACK_CONTRACT)
    }

    /// Get a network by name, falling back to the default
    pub fn get_network(&self, name: Option<&str>) -> Result<(&String, &NetworkConfig)> {
        let name = name.unwrap_or_else(|| self.default_network());
        self.networks.get_key_value(name).ok_or_else(|| {
            eyre!(
                "Unknown network '{}'. Configured networks: {}",
                name,
                sorted_keys(&self.networks)
            )
        })
    }

    /// Get a contract preset by label, falling back to the default
    pub fn get_contract(&self, label: Option<&str>) -> Result<(&String, &ContractConfig)> {
        let label = label.unwrap_or_else(|| self.default_contract());
        self.contracts.get_key_value(label).ok_or_else(|| {
            eyre!(
                "Unknown contract '{}'. Configured contracts: {}",
                label,
                sorted_keys(&self.contracts)
            )
        })
    }

    /// Resolve the deployer private key.
    ///
    /// Uses the named wallet (or the default wallet); with no wallet at all the
    /// key is read from `DEPLOYER_PRIVATE_KEY`.
    pub fn resolve_wallet_key(&self, name: Option<&str>) -> Result<Zeroizing<String>> {
        let name = name.or_else(|| self.defaults.as_ref().and_then(|d| d.wallet.as_deref()));

        let Some(name) = name else {
            return std::env::var(DEFAULT_KEY_ENV_VAR)
                .map(Zeroizing::new)
                .map_err(|_| eyre!("No wallet configured and {} is not set", DEFAULT_KEY_ENV_VAR));
        };

        let wallet = self
            .wallets
            .get(name)
            .ok_or_else(|| eyre!("Unknown wallet '{}'", name))?;
        tracing::debug!("Using wallet {}", wallet.label.as_deref().unwrap_or(name));

        if let Some(keychain_ref) = &wallet.keychain {
            KeychainManager::new()
                .get_zeroizing(keychain_ref)?
                .ok_or_else(|| eyre!("No keychain entry '{}' for wallet '{}'", keychain_ref, name))
        } else if let Some(env_var) = &wallet.env_var {
            std::env::var(env_var)
                .map(Zeroizing::new)
                .map_err(|_| eyre!("Wallet '{}' reads {} but it is not set", name, env_var))
        } else {
            Err(eyre!("Wallet '{}' has neither keychain nor env_var", name))
        }
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> String {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys.join(", ")
}

fn product(name: &str, description: &str) -> InitCall {
    InitCall {
        function: "createProduct".to_string(),
        args: vec![name.to_string(), description.to_string()],
    }
}

/// Networks, wallet and contract presets available without any config file
pub fn builtin_presets() -> AppConfig {
    let mut networks = HashMap::new();

    networks.insert(
        "localhost".to_string(),
        NetworkConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: Some(31337),
            explorer_url: None,
            confirmations: None,
        },
    );

    networks.insert(
        "sepolia".to_string(),
        NetworkConfig {
            rpc_url: "https://sepolia.drpc.org".to_string(),
            chain_id: Some(11155111),
            explorer_url: Some("https://sepolia.etherscan.io".to_string()),
            confirmations: None,
        },
    );

    let mut wallets = HashMap::new();
    wallets.insert(
        "deployer".to_string(),
        WalletConfig {
            keychain: None,
            env_var: Some(DEFAULT_KEY_ENV_VAR.to_string()),
            label: Some("Deployer from environment".to_string()),
        },
    );

    let mut contracts = HashMap::new();
    contracts.insert(
        "private-voting".to_string(),
        ContractConfig {
            name: "PrivateVotingSystem".to_string(),
            config_key: Some("CONTRACTS.PRIVATE_VOTING".to_string()),
            constructor_args: Vec::new(),
            seed: Vec::new(),
        },
    );
    contracts.insert(
        "public-voting".to_string(),
        ContractConfig {
            name: "PublicVotingSystem".to_string(),
            config_key: Some("CONTRACTS.PUBLIC_VOTING".to_string()),
            constructor_args: Vec::new(),
            seed: vec![
                product(
                    "MetaMask Wallet Extension",
                    "Browser extension for Ethereum wallet management and Web3 application interaction",
                ),
                product(
                    "Uniswap DEX Platform",
                    "Decentralized exchange for swapping cryptocurrencies with automated market makers",
                ),
                product(
                    "OpenSea NFT Marketplace",
                    "Leading marketplace for buying, selling, and creating NFTs on multiple blockchains",
                ),
                product(
                    "Chainlink Oracle Network",
                    "Decentralized oracle network providing real-world data to smart contracts",
                ),
            ],
        },
    );

    AppConfig {
        networks,
        wallets,
        contracts,
        defaults: None,
        config_path: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
[networks.sepolia]
rpc_url = "https://eth-sepolia.g.alchemy.com/v2/KEY"
chain_id = 11155111
confirmations = 3

[wallets.dev]
env_var = "DEV_KEY"

[contracts.feedback]
name = "ProductFeedbackVoting"
config_key = "CONTRACTS.PRODUCT_FEEDBACK_VOTING"

[[contracts.feedback.seed]]
function = "createProduct"
args = ["Widget", "A widget"]

[defaults]
network = "sepolia"
wallet = "dev"
contract = "feedback"
"#;

        let config: AppConfig = toml::from_str(content).unwrap();
        let (name, network) = config.get_network(None).unwrap();
        assert_eq!(name, "sepolia");
        assert_eq!(network.confirmations(), 3);

        let (label, contract) = config.get_contract(None).unwrap();
        assert_eq!(label, "feedback");
        let plan = contract.plan(label);
        assert_eq!(plan.contract_name, "ProductFeedbackVoting");
        assert_eq!(plan.seed, vec![product("Widget", "A widget")]);
    }

    #[test]
    fn test_user_entries_win_over_presets() {
        let mut config: AppConfig = toml::from_str(
            r#"
[networks.localhost]
rpc_url = "http://127.0.0.1:9545"
"#,
        )
        .unwrap();
        config.merge_presets(builtin_presets());

        let (_, localhost) = config.get_network(Some("localhost")).unwrap();
        assert_eq!(localhost.rpc_url, "http://127.0.0.1:9545");
        assert_eq!(localhost.confirmations(), DEFAULT_CONFIRMATIONS);
        assert!(config.get_network(Some("sepolia")).is_ok());
        assert!(config.get_network(Some("mainnet")).is_err());
    }

    #[test]
    fn test_presets_cover_both_voting_contracts() {
        let presets = builtin_presets();
        let (_, private) = presets.get_contract(None).unwrap();
        assert_eq!(private.name, "PrivateVotingSystem");
        assert!(private.seed.is_empty());

        let (_, public) = presets.get_contract(Some("public-voting")).unwrap();
        assert_eq!(public.seed.len(), 4);
        assert!(public.seed.iter().all(|c| c.function == "createProduct" && c.args.len() == 2));
    }

    #[test]
    fn test_load_prefers_project_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[defaults]\nnetwork = \"sepolia\"\n",
        )
        .unwrap();

        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.get_network(None).unwrap().0, "sepolia");
        assert_eq!(
            config.config_path(),
            Some(dir.path().join(PROJECT_CONFIG_FILE).as_path())
        );
        assert!(config.contracts.contains_key("public-voting"));
    }

    #[test]
    fn test_builtin_networks_wait_for_default_confirmations() {
        let presets = builtin_presets();
        for name in ["localhost", "sepolia"] {
            let (_, network) = presets.get_network(Some(name)).unwrap();
            assert_eq!(network.confirmations(), DEFAULT_CONFIRMATIONS);
        }
        assert_eq!(DEFAULT_CONFIRMATIONS, 5);
    }

    #[test]
    fn test_explorer_link() {
        let presets = builtin_presets();
        let (_, sepolia) = presets.get_network(Some("sepolia")).unwrap();
        assert_eq!(
            sepolia.explorer_link("0x1234567890123456789012345678901234567890").as_deref(),
            Some("https://sepolia.etherscan.io/address/0x1234567890123456789012345678901234567890")
        );
        let (_, localhost) = presets.get_network(None).unwrap();
        assert!(localhost.explorer_link("0x00").is_none());
    }

    #[test]
    fn test_wallet_from_env_var() {
        let config: AppConfig = toml::from_str(
            r#"
[wallets.ci]
env_var = "BALLOTCTL_TEST_CI_KEY"
"#,
        )
        .unwrap();

        assert!(config.resolve_wallet_key(Some("ci")).is_err());
        assert!(config.resolve_wallet_key(Some("missing")).is_err());
    }
}
