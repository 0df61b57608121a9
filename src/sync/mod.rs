//! Propagates a deployed contract address into the frontend configuration.

mod address;
mod document;

pub use address::validate_address;
pub use document::ConfigDocument;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Location of the frontend config, relative to the project root
pub const DEFAULT_CONFIG_FILE: &str = "frontend/public/config.js";

/// Property holding the voting contract address
pub const DEFAULT_ADDRESS_KEY: &str = "CONTRACTS.PRIVATE_VOTING";

const USAGE: &str = "Usage: ballotctl sync-config <ADDRESS>\n\
                     Example: ballotctl sync-config 0x1234567890123456789012345678901234567890";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no contract address provided\n\n{}", USAGE)]
    MissingArgument,

    #[error("invalid Ethereum address format: {0:?} (expected 0x followed by 40 hex characters)")]
    InvalidAddressFormat(String),

    #[error("no string property {0:?} found in config")]
    KeyNotFound(String),

    #[error("key {key:?} matches {count} properties in config; use the full dotted path")]
    AmbiguousKey { key: String, count: usize },

    #[error("value {0:?} cannot be written into a string literal without escaping")]
    UnquotableValue(String),

    #[error("unterminated {what} at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a successful sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub path: PathBuf,
    pub key: String,
    pub previous: String,
    pub changed: bool,
}

/// Rewrite the address stored under `key` in the config file at `path`.
///
/// The file is left untouched on any error, and is only rewritten when the
/// value actually changes.
pub fn sync_contract_address(
    path: &Path,
    key: &str,
    address: Option<&str>,
) -> Result<SyncOutcome, SyncError> {
    let address = validate_address(address.ok_or(SyncError::MissingArgument)?)?;

    let text = fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut doc = ConfigDocument::parse(text)?;
    let resolved_key = doc.find(key)?.path.clone();
    let previous = doc.set_string(&resolved_key, address)?;
    let changed = previous != address;

    if changed {
        fs::write(path, doc.as_str()).map_err(|source| SyncError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Updated {} from {} to {}", resolved_key, previous, address);
    } else {
        tracing::debug!("{} already set to {}", resolved_key, address);
    }

    Ok(SyncOutcome {
        path: path.to_path_buf(),
        key: resolved_key,
        previous,
        changed,
    })
}
