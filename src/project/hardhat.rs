use std::collections::HashMap;
use std::path::Path;

use eyre::{Result, eyre};

use super::detector::{HARDHAT_CONFIG_FILES, has_hardhat_config};
use super::{DEPLOYMENTS_DIR, Project, ProjectType, project_name};

/// Load a Hardhat project from the given path.
///
/// The config is JavaScript, so only Hardhat's conventional directories are used.
pub fn load_project(path: &Path) -> Result<Project> {
    if !has_hardhat_config(path) {
        return Err(eyre!(
            "None of {} found at {:?}",
            HARDHAT_CONFIG_FILES.join(", "),
            path
        ));
    }

    Ok(Project {
        project_type: ProjectType::Hardhat,
        root: path.to_path_buf(),
        name: project_name(path),
        artifacts_dir: path.join("artifacts"),
        deployments_dir: path.join(DEPLOYMENTS_DIR),
        rpc_endpoints: HashMap::new(),
    })
}
