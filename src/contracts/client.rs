use std::time::Duration;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use eyre::{Result, WrapErr, eyre};
use zeroize::Zeroizing;

/// Interval between chain-head polls while waiting for confirmations
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A transaction that has been included in a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedTransaction {
    pub hash: TxHash,
    pub block_number: u64,
    pub contract_address: Option<Address>,
}

/// The remote surface the deployer needs from a chain.
///
/// Every method blocks until the node has answered; sends block until mined.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing account
    fn signer_address(&self) -> Address;

    async fn balance(&self, address: Address) -> Result<U256>;

    /// Submit a contract-creation transaction and wait for it to be mined
    async fn deploy(&self, code: Bytes) -> Result<MinedTransaction>;

    /// Submit a call to `to` and wait for it to be mined
    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<MinedTransaction>;

    async fn block_number(&self) -> Result<u64>;

    /// Block until the transaction mined in `mined_in` has `confirmations` confirmations
    async fn wait_for_confirmations(&self, mined_in: u64, confirmations: u64) -> Result<()>;
}

/// Number of confirmations a transaction mined in `mined_in` has at `head`.
///
/// The inclusion block itself counts as the first confirmation.
pub fn confirmations_at(head: u64, mined_in: u64) -> u64 {
    if head < mined_in {
        0
    } else {
        head - mined_in + 1
    }
}

/// `ChainClient` backed by an alloy HTTP provider with a local signer
pub struct AlloyClient {
    provider: DynProvider,
    signer: Address,
    poll_interval: Duration,
}

impl AlloyClient {
    /// Connect to `rpc_url` and sign with `private_key`.
    ///
    /// When `expected_chain_id` is set, the node's chain id must match it.
    pub async fn connect(
        rpc_url: &str,
        private_key: Zeroizing<String>,
        expected_chain_id: Option<u64>,
    ) -> Result<Self> {
        let key_str = private_key.as_str().trim();
        let clean_key = key_str.strip_prefix("0x").unwrap_or(key_str);

        let signer: PrivateKeySigner = clean_key.parse().wrap_err("Failed to parse private key")?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(rpc_url)
            .await
            .wrap_err_with(|| format!("Failed to connect to RPC {}", rpc_url))?
            .erased();

        if let Some(expected) = expected_chain_id {
            let actual = provider
                .get_chain_id()
                .await
                .wrap_err("Failed to fetch chain id")?;
            if actual != expected {
                return Err(eyre!(
                    "RPC {} reports chain id {} but the network is configured for {}",
                    rpc_url,
                    actual,
                    expected
                ));
            }
        }

        tracing::debug!("Connected to {} as {}", rpc_url, address);

        Ok(Self {
            provider,
            signer: address,
            poll_interval: CONFIRMATION_POLL_INTERVAL,
        })
    }

    async fn send_and_wait(&self, tx: TransactionRequest, what: &str) -> Result<MinedTransaction> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .wrap_err_with(|| format!("Failed to send {}", what))?;

        tracing::debug!("Sent {}: {}", what, pending.tx_hash());

        let receipt = pending
            .get_receipt()
            .await
            .wrap_err_with(|| format!("Failed waiting for {} to be mined", what))?;

        mined(receipt)
    }
}

fn mined(receipt: TransactionReceipt) -> Result<MinedTransaction> {
    if !receipt.status() {
        return Err(eyre!("Transaction {} reverted", receipt.transaction_hash));
    }

    let block_number = receipt
        .block_number
        .ok_or_else(|| eyre!("Receipt for {} has no block number", receipt.transaction_hash))?;

    Ok(MinedTransaction {
        hash: receipt.transaction_hash,
        block_number,
        contract_address: receipt.contract_address,
    })
}

#[async_trait]
impl ChainClient for AlloyClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .wrap_err("Failed to fetch balance")
    }

    async fn deploy(&self, code: Bytes) -> Result<MinedTransaction> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_deploy_code(code);
        self.send_and_wait(tx, "deployment transaction").await
    }

    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<MinedTransaction> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(to)
            .with_input(calldata);
        self.send_and_wait(tx, "transaction").await
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("Failed to fetch block number")
    }

    async fn wait_for_confirmations(&self, mined_in: u64, confirmations: u64) -> Result<()> {
        loop {
            let head = self.block_number().await?;
            let have = confirmations_at(head, mined_in);
            if have >= confirmations {
                return Ok(());
            }

            tracing::debug!("{}/{} confirmations at block {}", have, confirmations, head);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
