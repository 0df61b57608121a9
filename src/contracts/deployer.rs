use std::path::PathBuf;

use alloy::primitives::{Bytes, TxHash, utils::format_ether};
use chrono::Utc;
use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

use super::artifact::ContractArtifact;
use super::client::ChainClient;
use super::deployment::{DeploymentRecord, DeploymentStore};

/// Confirmations to wait for after the deployment is mined
pub const DEFAULT_CONFIRMATIONS: u64 = 5;

/// A transaction to run against the freshly deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitCall {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// What to deploy and how to initialize it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// Label used in the record file name, e.g. `private-voting`
    pub label: String,
    /// Contract name as compiled, e.g. `PrivateVotingSystem`
    pub contract_name: String,
    pub constructor_args: Vec<String>,
    pub seed: Vec<InitCall>,
}

/// Where the deployment goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    pub network: String,
    pub confirmations: u64,
}

#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
    pub record_path: PathBuf,
    pub tx_hash: TxHash,
}

/// Deploy `artifact` according to `plan` and persist the deployment record.
///
/// The record is written as soon as the contract is mined, before the seed
/// calls run, so a failing seed call leaves the record in place.
pub async fn deploy<C: ChainClient + ?Sized>(
    client: &C,
    artifact: &ContractArtifact,
    plan: &DeploymentPlan,
    context: &DeployContext,
    store: &DeploymentStore,
) -> Result<DeploymentOutcome> {
    println!("Deploying {} contract...", plan.contract_name);

    // Encode everything up front so bad arguments fail before any gas is spent
    let code = artifact.deploy_code(&plan.constructor_args)?;
    let seed_calls: Vec<(&InitCall, Bytes)> = plan
        .seed
        .iter()
        .map(|call| -> Result<(&InitCall, Bytes)> {
            Ok((call, artifact.encode_call(&call.function, &call.args)?))
        })
        .collect::<Result<_>>()?;

    let deployer = client.signer_address();
    println!("Deploying with account: {}", deployer);
    match client.balance(deployer).await {
        Ok(balance) => println!("Account balance: {} ETH", format_ether(balance)),
        Err(e) => tracing::warn!("Could not read deployer balance: {:#}", e),
    }

    let mined = client
        .deploy(code)
        .await
        .wrap_err_with(|| format!("Failed to deploy {}", plan.contract_name))?;
    let contract = mined.contract_address.ok_or_else(|| {
        eyre!(
            "Deployment transaction {} has no contract address",
            mined.hash
        )
    })?;
    println!("{} deployed to: {}", plan.contract_name, contract);

    let block_number = client.block_number().await?;
    let mut record = DeploymentRecord::new(
        contract,
        deployer,
        &context.network,
        Utc::now(),
        block_number,
    );
    if !plan.seed.is_empty() {
        record.product_count = Some(plan.seed.len() as u64);
    }

    let record_path = store.write(&plan.label, &record)?;
    println!("Deployment info saved to {}", record_path.display());

    if !seed_calls.is_empty() {
        println!("Running {} initialization call(s)...", seed_calls.len());
    }
    for (i, (call, calldata)) in seed_calls.into_iter().enumerate() {
        let tx = client
            .send_call(contract, calldata)
            .await
            .wrap_err_with(|| format!("Initialization call {} ({}) failed", i + 1, call.function))?;

        tracing::debug!("{} mined in block {}", tx.hash, tx.block_number);
        match call.args.first() {
            Some(first) => println!("Created {} {}: {}", created_noun(&call.function), i + 1, first),
            None => println!("Called {} ({})", call.function, i + 1),
        }
    }

    if context.confirmations > 1 {
        println!("Waiting for {} confirmations...", context.confirmations);
    }
    client
        .wait_for_confirmations(mined.block_number, context.confirmations)
        .await?;

    println!("Contract deployed successfully!");

    Ok(DeploymentOutcome {
        record,
        record_path,
        tx_hash: mined.hash,
    })
}

/// `createProduct` -> `product`; other function names are shown as is
fn created_noun(function: &str) -> String {
    match function.strip_prefix("create") {
        Some(rest) if !rest.is_empty() => {
            let mut chars = rest.chars();
            chars
                .next()
                .map(|c| c.to_lowercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        }
        _ => function.to_string(),
    }
}
