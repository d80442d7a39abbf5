//! Contract deployment
//!
//! Compile a Solidity source, submit its creation transaction, wait for it to
//! be mined and persist the `{address, abi}` descriptor consumed by the
//! voting client.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use voting_dapp::contract::SolcCompiler;
//! use voting_dapp::deploy::{DeployConfig, Deployer};
//! use voting_dapp::rpc::HttpNode;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeployConfig::default();
//! let node = Arc::new(HttpNode::connect(&config.endpoint)?);
//! let deployer = Deployer::new(node, config);
//! let descriptor = deployer.deploy(&SolcCompiler::new(), Path::new("contracts/Voting.sol")).await?;
//! println!("Deployed at {}", descriptor.address);
//! # Ok(())
//! # }
//! ```

pub mod deployer;
pub mod status;

pub use deployer::{DeployConfig, DeployError, Deployer, DEFAULT_ENDPOINT, DEFAULT_GAS_LIMIT};
pub use status::{DeploymentStatus, DeploymentSubscription};
