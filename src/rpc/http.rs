//! HTTP JSON-RPC node client backed by ethers

use crate::rpc::provider::{ChainNode, NodeError, TxReceipt, TxRequest};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::types::{Address, Bytes, TransactionRequest, H256};
use std::time::Duration;

impl From<ProviderError> for NodeError {
    fn from(err: ProviderError) -> Self {
        NodeError::Rpc(err.to_string())
    }
}

/// Node reached over HTTP, e.g. ganache or anvil on port 8545
#[derive(Debug, Clone)]
pub struct HttpNode {
    endpoint: String,
    provider: Provider<Http>,
}

impl HttpNode {
    /// Connect to an RPC endpoint URL
    pub fn connect(endpoint: &str) -> Result<Self, NodeError> {
        let provider = Provider::<Http>::try_from(endpoint)
            .map_err(|e| NodeError::InvalidEndpoint(endpoint.to_string(), e.to_string()))?
            .interval(Duration::from_millis(200));

        log::info!("Using RPC endpoint {}", endpoint);
        Ok(Self {
            endpoint: endpoint.to_string(),
            provider,
        })
    }

    /// The endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainNode for HttpNode {
    async fn accounts(&self) -> Result<Vec<Address>, NodeError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<H256, NodeError> {
        let mut request = TransactionRequest::new()
            .from(tx.from)
            .data(tx.data)
            .gas(tx.gas);
        if let Some(to) = tx.to {
            request = request.to(to);
        }

        let pending = self.provider.send_transaction(request, None).await?;
        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, NodeError> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.map(|r| TxReceipt {
            tx_hash: r.transaction_hash,
            contract_address: r.contract_address,
            block_number: r.block_number.map(|n| n.as_u64()),
            // Pre-Byzantium nodes omit status
            success: r.status.map(|s| s.as_u64() == 1).unwrap_or(true),
        }))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, NodeError> {
        let request = TransactionRequest::new().to(to).data(data);
        Ok(self.provider.call(&request.into(), None).await?)
    }
}
