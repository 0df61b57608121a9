use std::collections::HashMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

use super::{DEPLOYMENTS_DIR, Project, ProjectType, project_name};

/// The parts of foundry.toml that decide where build output lands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoundryConfig {
    #[serde(default)]
    pub profile: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub out: Option<String>,
    #[serde(default)]
    pub rpc_endpoints: HashMap<String, String>,
}

impl FoundryConfig {
    /// Active profile: `FOUNDRY_PROFILE` if set and present, else `default`
    pub fn active_profile(&self) -> Option<&ProfileConfig> {
        std::env::var("FOUNDRY_PROFILE")
            .ok()
            .and_then(|name| self.profile.get(&name))
            .or_else(|| self.profile.get("default"))
    }

    pub fn out_dir(&self) -> &str {
        self.active_profile()
            .and_then(|p| p.out.as_deref())
            .unwrap_or("out")
    }
}

pub fn load_config(path: &Path) -> Result<FoundryConfig> {
    let config_path = path.join("foundry.toml");

    if !config_path.exists() {
        return Err(eyre!("foundry.toml not found at {:?}", path));
    }

    let config_content = fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("Failed to read {:?}", config_path))?;

    toml::from_str(&config_content).wrap_err("Failed to parse foundry.toml")
}

/// Load a Foundry project from the given path
pub fn load_project(path: &Path) -> Result<Project> {
    let config = load_config(path)?;

    Ok(Project {
        project_type: ProjectType::Foundry,
        root: path.to_path_buf(),
        name: project_name(path),
        artifacts_dir: path.join(config.out_dir()),
        deployments_dir: path.join(DEPLOYMENTS_DIR),
        rpc_endpoints: config
            .active_profile()
            .map(|p| p.rpc_endpoints.clone())
            .unwrap_or_default(),
    })
}
