//! Bound contract handle
//!
//! A deployed contract reconstructed from its descriptor. Every call goes
//! through the schema first, so an undeclared member never reaches the node.

use crate::contract::abi::{shape_arguments, AbiError, InterfaceSchema};
use crate::rpc::{ChainNode, NodeError, TxRequest};
use crate::storage::{DeploymentDescriptor, DescriptorError};
use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes, H256};
use thiserror::Error;

/// Errors from calling a bound contract
#[derive(Error, Debug)]
pub enum CallError {
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
    #[error("Cannot decode {method} output: {reason}")]
    Decode { method: String, reason: String },
    #[error("{method} is read-only and cannot be sent as a transaction")]
    NotMutating { method: String },
}

/// Handle to a deployed contract
#[derive(Debug, Clone)]
pub struct ContractHandle {
    address: Address,
    abi: Abi,
    schema: InterfaceSchema,
}

impl ContractHandle {
    /// Bind to a contract at `address` with the given interface
    pub fn new(address: Address, abi: Abi) -> Self {
        let schema = InterfaceSchema::from_abi(&abi);
        Self {
            address,
            abi,
            schema,
        }
    }

    /// Bind from a loaded descriptor
    pub fn from_descriptor(descriptor: &DeploymentDescriptor) -> Result<Self, DescriptorError> {
        let address = descriptor.contract_address()?;
        let abi = descriptor.parse_abi()?;
        Ok(Self::new(address, abi))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn schema(&self) -> &InterfaceSchema {
        &self.schema
    }

    /// Encode calldata for `method` from text arguments
    pub fn encode_call(&self, method: &str, args: &[String]) -> Result<Bytes, AbiError> {
        let declared = self.schema.method(method)?;
        let tokens = shape_arguments(method, &declared.inputs, args)?;
        let function = self
            .abi
            .function(method)
            .map_err(|_| AbiError::UnknownMethod(method.to_string()))?;
        let data = function
            .encode_input(&tokens)
            .map_err(|e| AbiError::Encoding(e.to_string()))?;
        Ok(Bytes::from(data))
    }

    /// Read-only call returning the decoded outputs
    pub async fn call(
        &self,
        node: &dyn ChainNode,
        method: &str,
        args: &[String],
    ) -> Result<Vec<Token>, CallError> {
        let data = self.encode_call(method, args)?;
        log::debug!("eth_call {}({:?}) on {:?}", method, args, self.address);

        let output = node.call(self.address, data).await?;
        let function = self
            .abi
            .function(method)
            .map_err(|_| AbiError::UnknownMethod(method.to_string()))?;
        function
            .decode_output(output.as_ref())
            .map_err(|e| CallError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            })
    }

    /// Submit a state-changing call signed by `from`
    pub async fn send(
        &self,
        node: &dyn ChainNode,
        method: &str,
        args: &[String],
        from: Address,
        gas: u64,
    ) -> Result<H256, CallError> {
        if !self.schema.method(method)?.is_mutating() {
            return Err(CallError::NotMutating {
                method: method.to_string(),
            });
        }
        let data = self.encode_call(method, args)?;
        log::debug!("eth_sendTransaction {}({:?}) from {:?}", method, args, from);

        let tx_hash = node
            .send_transaction(TxRequest {
                from,
                to: Some(self.address),
                data,
                gas,
            })
            .await?;
        Ok(tx_hash)
    }
}
