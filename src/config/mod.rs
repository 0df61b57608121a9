mod keychain;
mod settings;

pub use keychain::KeychainManager;
pub use settings::{AppConfig, NetworkConfig};
