use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Metadata written once per deployment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_address: String,
    pub deployer_address: String,
    pub network: String,
    /// ISO-8601 UTC, millisecond precision
    pub deployed_at: String,
    pub block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
}

impl DeploymentRecord {
    pub fn new(
        contract: Address,
        deployer: Address,
        network: &str,
        deployed_at: DateTime<Utc>,
        block_number: u64,
    ) -> Self {
        Self {
            contract_address: contract.to_checksum(None),
            deployer_address: deployer.to_checksum(None),
            network: network.to_string(),
            deployed_at: deployed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            block_number,
            product_count: None,
        }
    }
}

/// A record found on disk together with where it came from
#[derive(Debug, Clone)]
pub struct StoredDeployment {
    pub label: String,
    pub path: PathBuf,
    pub record: DeploymentRecord,
}

/// Reads and writes `deployments/<network>-<label>.json`
pub struct DeploymentStore {
    dir: PathBuf,
}

impl DeploymentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, network: &str, label: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.json", network, label))
    }

    /// Write a record, creating the directory if needed and replacing any
    /// previous record for the same network and label
    pub fn write(&self, label: &str, record: &DeploymentRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("Failed to create {:?}", self.dir))?;

        let path = self.record_path(&record.network, label);
        let content =
            serde_json::to_string_pretty(record).wrap_err("Failed to serialize deployment")?;

        fs::write(&path, content).wrap_err_with(|| format!("Failed to write {:?}", path))?;

        tracing::info!("Wrote deployment record {:?}", path);
        Ok(path)
    }

    pub fn load(&self, network: &str, label: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(network, label);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    /// All records in the directory, sorted by network then label
    pub fn scan(&self) -> Result<Vec<StoredDeployment>> {
        if !self.dir.exists() {
            tracing::info!("Deployments directory does not exist: {:?}", self.dir);
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.dir).wrap_err_with(|| format!("Failed to read {:?}", self.dir))?;

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let record = match read_record(&path) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let label = stem
                .strip_prefix(&format!("{}-", record.network))
                .unwrap_or(&stem)
                .to_string();

            found.push(StoredDeployment {
                label,
                path,
                record,
            });
        }

        found.sort_by(|a, b| {
            (&a.record.network, &a.label).cmp(&(&b.record.network, &b.label))
        });

        Ok(found)
    }
}

fn read_record(path: &Path) -> Result<DeploymentRecord> {
    let content =
        fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("Failed to parse {:?}", path))
}
