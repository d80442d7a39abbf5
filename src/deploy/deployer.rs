//! Contract deployment
//!
//! Compiles a contract, submits its creation transaction from an unlocked
//! node account, waits for it to be mined and persists the resulting
//! [`DeploymentDescriptor`].

use crate::contract::abi::{shape_arguments, AbiError, InterfaceSchema};
use crate::contract::{CompileError, CompiledArtifact, ContractCompiler, ContractSource};
use crate::deploy::status::{DeploymentStatus, DeploymentSubscription};
use crate::rpc::{select_account, ChainNode, NodeError, TxRequest};
use crate::storage::{DeploymentDescriptor, DescriptorError, DescriptorStore, DEFAULT_DESCRIPTOR_PATH};
use ethers::types::{Address, Bytes, H256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default RPC endpoint of a local test node
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8545";

/// Default gas budget for contract creation
pub const DEFAULT_GAS_LIMIT: u64 = 4_700_000;

/// Deployment errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Compile error: {0}")]
    CompileError(#[from] CompileError),
    #[error("Constructor arguments: {0}")]
    ConstructorArgs(#[from] AbiError),
    #[error("Node rejected the deployment: {0}")]
    SubmissionError(String),
    #[error("Deployment not mined within {0:?}")]
    DeploymentTimeout(Duration),
    #[error("Failed to write descriptor: {0}")]
    DescriptorWriteError(#[from] DescriptorError),
}

impl From<NodeError> for DeployError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Timeout(after, _) => DeployError::DeploymentTimeout(after),
            other => DeployError::SubmissionError(other.to_string()),
        }
    }
}

/// Deployment configuration
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// RPC endpoint URL
    pub endpoint: String,
    /// Which of the node's unlocked accounts signs the creation
    pub sender_index: usize,
    /// Gas ceiling for the creation transaction
    pub gas_limit: u64,
    /// Constructor arguments, in order, as text
    pub constructor_args: Vec<String>,
    /// Contract to pick from the compiled source unit
    pub contract_name: String,
    /// Where the descriptor is written
    pub descriptor_path: PathBuf,
    /// Receipt polling interval
    pub poll_interval: Duration,
    /// Upper bound on waiting for the mined phase
    pub mining_timeout: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sender_index: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            constructor_args: vec!["==".to_string(), "= =".to_string()],
            contract_name: "Voting".to_string(),
            descriptor_path: PathBuf::from(DEFAULT_DESCRIPTOR_PATH),
            poll_interval: Duration::from_millis(500),
            mining_timeout: Duration::from_secs(120),
        }
    }
}

/// Deploys compiled contracts to a node
pub struct Deployer {
    node: Arc<dyn ChainNode>,
    config: DeployConfig,
}

impl Deployer {
    /// Create a deployer talking to `node`
    pub fn new(node: Arc<dyn ChainNode>, config: DeployConfig) -> Self {
        Self { node, config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Resolve the signing account from the configured index
    pub async fn sender(&self) -> Result<Address, DeployError> {
        Ok(select_account(self.node.as_ref(), self.config.sender_index).await?)
    }

    /// Creation calldata: bytecode followed by encoded constructor arguments
    pub fn creation_data(&self, artifact: &CompiledArtifact) -> Result<Bytes, DeployError> {
        let code = artifact.bytecode_bytes()?;
        let schema = InterfaceSchema::from_abi(&artifact.abi);
        let tokens = shape_arguments(
            "constructor",
            schema.constructor_inputs(),
            &self.config.constructor_args,
        )?;

        let data = match &artifact.abi.constructor {
            Some(constructor) => constructor
                .encode_input(code, &tokens)
                .map_err(|e| AbiError::Encoding(e.to_string()))?,
            None => code,
        };
        Ok(Bytes::from(data))
    }

    /// Submit the creation transaction and watch it until mined
    pub async fn submit(
        &self,
        artifact: &CompiledArtifact,
    ) -> Result<DeploymentSubscription, DeployError> {
        let data = self.creation_data(artifact)?;
        let timeout = self.config.mining_timeout;

        let submission = async {
            let from = self.sender().await?;
            self.node
                .send_transaction(TxRequest {
                    from,
                    to: None,
                    data,
                    gas: self.config.gas_limit,
                })
                .await
                .map_err(DeployError::from)
        };
        let tx_hash = tokio::time::timeout(timeout, submission)
            .await
            .map_err(|_| DeployError::DeploymentTimeout(timeout))??;

        let (sender, receiver) = mpsc::channel(4);
        let node = self.node.clone();
        let poll_interval = self.config.poll_interval;

        let watcher = tokio::spawn(async move {
            if sender
                .send(Ok(DeploymentStatus::Pending { tx_hash }))
                .await
                .is_err()
            {
                return;
            }
            let outcome = watch_creation(node.as_ref(), tx_hash, poll_interval, timeout).await;
            let _ = sender.send(outcome).await;
        });

        Ok(DeploymentSubscription::new(receiver, watcher))
    }

    /// Compile, deploy and persist the descriptor for the source at `source_path`
    ///
    /// Nothing is written unless the contract was mined at a known address.
    pub async fn deploy(
        &self,
        compiler: &dyn ContractCompiler,
        source_path: &Path,
    ) -> Result<DeploymentDescriptor, DeployError> {
        let timeout = self.config.mining_timeout;
        let accounts = tokio::time::timeout(timeout, self.node.accounts())
            .await
            .map_err(|_| DeployError::DeploymentTimeout(timeout))??;
        log::info!("Available accounts: {:?}", accounts);

        let source = ContractSource::read(source_path)?;
        let artifact = compiler.compile(&source, &self.config.contract_name)?;
        log::info!(
            "Compiled {} ({} bytes of bytecode)",
            artifact.contract_name,
            artifact.bytecode.len() / 2
        );
        log::debug!("Bytecode: {}", artifact.bytecode);
        log::debug!("ABI: {}", artifact.abi_json().unwrap_or_default());

        let mut subscription = self.submit(&artifact).await?;
        while let Some(update) = subscription.next().await {
            match update {
                Ok(DeploymentStatus::Pending { tx_hash }) => {
                    log::info!(
                        "Contract transaction sent: {:?}, waiting to be mined...",
                        tx_hash
                    );
                }
                Ok(DeploymentStatus::Mined {
                    address,
                    block_number,
                    ..
                }) => {
                    log::info!("Contract mined! Address: {:?} (block {:?})", address, block_number);
                    return self.persist(address, &artifact);
                }
                Err(e) => {
                    log::error!("Deployment failed: {}", e);
                    return Err(e);
                }
            }
        }

        Err(DeployError::SubmissionError(
            "deployment watcher stopped before the transaction was mined".to_string(),
        ))
    }

    fn persist(
        &self,
        address: Address,
        artifact: &CompiledArtifact,
    ) -> Result<DeploymentDescriptor, DeployError> {
        let descriptor = DeploymentDescriptor::new(address, &artifact.abi)?;
        let store = DescriptorStore::new(&self.config.descriptor_path);
        if let Err(e) = store.save(&descriptor) {
            log::error!("Failed to write {:?}: {}", store.path(), e);
            return Err(e.into());
        }
        log::info!("The file {:?} was saved", store.path());
        Ok(descriptor)
    }
}

async fn watch_creation(
    node: &dyn ChainNode,
    tx_hash: H256,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<DeploymentStatus, DeployError> {
    let receipt = crate::rpc::wait_for_receipt(node, tx_hash, poll_interval, timeout).await?;
    if !receipt.success {
        return Err(DeployError::SubmissionError(format!(
            "creation transaction {:?} reverted",
            tx_hash
        )));
    }
    match receipt.contract_address {
        Some(address) if !address.is_zero() => Ok(DeploymentStatus::Mined {
            tx_hash,
            address,
            block_number: receipt.block_number,
        }),
        _ => Err(DeployError::SubmissionError(format!(
            "transaction {:?} was mined without creating a contract",
            tx_hash
        ))),
    }
}
