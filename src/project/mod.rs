mod detector;
mod foundry;
mod hardhat;

pub use detector::detect;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eyre::Result;
use serde::{Deserialize, Serialize};

/// Directory deployment records are written to, relative to the project root
pub const DEPLOYMENTS_DIR: &str = "deployments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    Foundry,
    Hardhat,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Foundry => write!(f, "Foundry"),
            ProjectType::Hardhat => write!(f, "Hardhat"),
        }
    }
}

/// A contracts project whose build output we deploy from
#[derive(Debug, Clone)]
pub struct Project {
    pub project_type: ProjectType,
    pub root: PathBuf,
    pub name: String,
    /// Compiler output (`artifacts/` for Hardhat, `out/` for Foundry)
    pub artifacts_dir: PathBuf,
    pub deployments_dir: PathBuf,
    /// Named RPC endpoints declared by the project itself (foundry.toml)
    pub rpc_endpoints: HashMap<String, String>,
}

impl Project {
    pub fn new_foundry(path: &Path) -> Result<Self> {
        foundry::load_project(path)
    }

    pub fn new_hardhat(path: &Path) -> Result<Self> {
        hardhat::load_project(path)
    }

    /// Load with a forced type, or detect from the files present
    pub fn open(path: &Path, project_type: Option<&str>) -> Result<Self> {
        match project_type {
            Some("foundry") => Self::new_foundry(path),
            Some("hardhat") => Self::new_hardhat(path),
            _ => detect(path),
        }
    }
}

fn project_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
