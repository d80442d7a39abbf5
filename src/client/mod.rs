//! Voting client
//!
//! Binds a deployed ballot contract from its descriptor and renders vote
//! totals into named display locations.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voting_dapp::client::{ClientConfig, ConsoleView, VotingClient};
//! use voting_dapp::rpc::HttpNode;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let node = Arc::new(HttpNode::connect(&config.endpoint)?);
//! let client = VotingClient::initialize(node, Arc::new(ConsoleView), config)?;
//! client.render_all().await?;
//!
//! let sender = client.default_sender().await?;
//! client.vote("==", sender).await?;
//! # Ok(())
//! # }
//! ```

pub mod registry;
pub mod view;
pub mod workflow;

pub use registry::{CandidateRegistry, CandidateSlot, RegistryError};
pub use view::{ConsoleView, TallyView};
pub use workflow::{ClientConfig, ClientError, VotingClient, TOTAL_VOTES_METHOD, VOTE_METHOD};
