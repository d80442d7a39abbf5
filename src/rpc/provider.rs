//! Node RPC seam
//!
//! Everything the deployer and the voting client need from an Ethereum
//! JSON-RPC node, at the level of raw calldata and transaction receipts.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256};
use std::time::Duration;
use thiserror::Error;

/// Node errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Invalid RPC endpoint {0}: {1}")]
    InvalidEndpoint(String, String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Timed out after {0:?} waiting for transaction {1:?}")]
    Timeout(Duration, H256),
}

/// Mined transaction summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    /// Address of the contract created by this transaction, if any
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    /// False when the transaction was mined but reverted
    pub success: bool,
}

/// Unsigned transaction sent from an account the node has unlocked
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub data: Bytes,
    pub gas: u64,
}

/// Ethereum JSON-RPC node
#[async_trait]
pub trait ChainNode: Send + Sync {
    /// Accounts the node can sign for (`eth_accounts`)
    async fn accounts(&self) -> Result<Vec<Address>, NodeError>;

    /// Submit a transaction to the pending pool (`eth_sendTransaction`)
    async fn send_transaction(&self, tx: TxRequest) -> Result<H256, NodeError>;

    /// Receipt of a mined transaction, `None` while still pending
    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, NodeError>;

    /// Read-only call against the latest state (`eth_call`)
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, NodeError>;
}

/// Poll for a receipt until it shows up or `timeout` elapses
pub async fn wait_for_receipt(
    node: &dyn ChainNode,
    tx_hash: H256,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<TxReceipt, NodeError> {
    let poll = async {
        loop {
            if let Some(receipt) = node.transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            log::debug!("Transaction {:?} not mined yet", tx_hash);
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result,
        Err(_) => Err(NodeError::Timeout(timeout, tx_hash)),
    }
}

/// Pick the account at `index` from the node's account list
pub async fn select_account(node: &dyn ChainNode, index: usize) -> Result<Address, NodeError> {
    let accounts = node.accounts().await?;
    log::debug!("Node exposes {} account(s)", accounts.len());
    accounts.get(index).copied().ok_or_else(|| {
        NodeError::Rpc(format!(
            "account index {} out of range ({} available)",
            index,
            accounts.len()
        ))
    })
}
