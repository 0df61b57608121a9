mod artifact;
mod client;
mod deployer;
mod deployment;

pub use artifact::ContractArtifact;
pub use client::AlloyClient;
pub use deployer::{DEFAULT_CONFIRMATIONS, DeployContext, DeploymentPlan, InitCall, deploy};
pub use deployment::DeploymentStore;
