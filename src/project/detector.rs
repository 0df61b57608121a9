use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, foundry, hardhat};

/// Hardhat config file names, in lookup order
pub const HARDHAT_CONFIG_FILES: [&str; 4] = [
    "hardhat.config.js",
    "hardhat.config.ts",
    "hardhat.config.cjs",
    "hardhat.config.mjs",
];

pub fn has_hardhat_config(path: &Path) -> bool {
    HARDHAT_CONFIG_FILES
        .iter()
        .any(|name| path.join(name).exists())
}

/// Detect the project type based on configuration files present in the directory
pub fn detect(path: &Path) -> Result<Project> {
    // Foundry first: mixed repos keep foundry.toml next to a Hardhat config
    if path.join("foundry.toml").exists() {
        tracing::info!("Detected Foundry project at {:?}", path);
        return foundry::load_project(path);
    }

    if has_hardhat_config(path) {
        tracing::info!("Detected Hardhat project at {:?}", path);
        return hardhat::load_project(path);
    }

    Err(eyre!(
        "No Foundry or Hardhat project detected at {:?}\n\
         Expected: foundry.toml or hardhat.config.{{js,ts,cjs,mjs}}",
        path
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectType;

    #[test]
    fn test_detect_project_types() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect(dir.path()).is_err());

        std::fs::write(dir.path().join("hardhat.config.cjs"), "module.exports = {};").unwrap();
        let project = detect(dir.path()).unwrap();
        assert_eq!(project.project_type, ProjectType::Hardhat);
        assert_eq!(project.artifacts_dir, dir.path().join("artifacts"));
        assert_eq!(project.deployments_dir, dir.path().join("deployments"));

        std::fs::write(dir.path().join("foundry.toml"), "[profile.default]\n").unwrap();
        assert_eq!(detect(dir.path()).unwrap().project_type, ProjectType::Foundry);
    }
}
