//! Voting dApp: deploy a Solidity ballot to an Ethereum node and vote on it
//!
//! This crate provides:
//! - Solidity compilation through `solc` with compiler errors enforced
//! - Contract deployment with explicit pending/mined phases and bounded waits
//! - A persisted `{address, abi}` descriptor bridging deployment and client
//! - A typed interface schema validated when a contract handle is bound
//! - A voting client rendering tallies into named display locations
//! - A small web page and REST/WebSocket API driving the client
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use voting_dapp::client::{ClientConfig, ConsoleView, VotingClient};
//! use voting_dapp::contract::SolcCompiler;
//! use voting_dapp::deploy::{DeployConfig, Deployer};
//! use voting_dapp::rpc::HttpNode;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // Deploy once
//! let node = Arc::new(HttpNode::connect("http://localhost:8545")?);
//! let deployer = Deployer::new(node.clone(), DeployConfig::default());
//! deployer.deploy(&SolcCompiler::new(), Path::new("contracts/Voting.sol")).await?;
//!
//! // Then read and vote through the descriptor
//! let client = VotingClient::initialize(node, Arc::new(ConsoleView), ClientConfig::default())?;
//! client.render_all().await?;
//! let sender = client.default_sender().await?;
//! client.vote("==", sender).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod contract;
pub mod deploy;
pub mod rpc;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use client::{CandidateRegistry, ClientConfig, ClientError, TallyView, VotingClient};
pub use contract::{CompiledArtifact, ContractCompiler, ContractHandle, InterfaceSchema, SolcCompiler};
pub use deploy::{DeployConfig, DeployError, Deployer, DeploymentStatus, DeploymentSubscription};
pub use rpc::{ChainNode, HttpNode};
pub use storage::{DeploymentDescriptor, DescriptorStore};
