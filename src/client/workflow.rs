//! Voting client workflow
//!
//! Loads the deployment descriptor, binds the ballot contract and keeps a
//! [`TallyView`] in sync with on-chain vote totals.

use crate::client::registry::{CandidateRegistry, RegistryError};
use crate::client::view::TallyView;
use crate::contract::{token_to_text, AbiError, CallError, ContractHandle};
use crate::deploy::{DEFAULT_ENDPOINT, DEFAULT_GAS_LIMIT};
use crate::rpc::{select_account, wait_for_receipt, ChainNode, NodeError};
use crate::storage::{DescriptorError, DescriptorStore, DEFAULT_DESCRIPTOR_PATH};
use ethers::types::Address;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Read-only tally getter
pub const TOTAL_VOTES_METHOD: &str = "totalVotesFor";

/// State-changing vote call
pub const VOTE_METHOD: &str = "voteForCandidate";

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Cannot load deployment descriptor: {0}")]
    DescriptorLoadError(#[from] DescriptorError),
    #[error("Contract interface mismatch: {0}")]
    Bind(#[from] AbiError),
    #[error("Unknown candidate: {0:?}")]
    UnknownCandidate(String),
    #[error("Call failed: {0}")]
    CallError(#[from] CallError),
    #[error("Call timed out after {0:?}")]
    CallTimeout(Duration),
    #[error("Vote for {candidate:?} failed: {reason}")]
    VoteFailed { candidate: String, reason: String },
    #[error("No signing account: {0}")]
    Account(NodeError),
    #[error("Registry error: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for ClientError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownCandidate(candidate) => ClientError::UnknownCandidate(candidate),
            other => ClientError::Registry(other),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// RPC endpoint URL
    pub endpoint: String,
    /// Descriptor written by the deployer
    pub descriptor_path: PathBuf,
    /// Default signing account index for votes
    pub sender_index: usize,
    /// Gas ceiling for vote transactions
    pub gas_limit: u64,
    /// Receipt polling interval
    pub poll_interval: Duration,
    /// Upper bound on waiting for a call or vote to complete
    pub call_timeout: Duration,
    pub registry: CandidateRegistry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            descriptor_path: PathBuf::from(DEFAULT_DESCRIPTOR_PATH),
            sender_index: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval: Duration::from_millis(500),
            call_timeout: Duration::from_secs(60),
            registry: CandidateRegistry::default(),
        }
    }
}

/// Ballot client bound to a deployed contract
pub struct VotingClient {
    node: Arc<dyn ChainNode>,
    contract: ContractHandle,
    view: Arc<dyn TallyView>,
    config: ClientConfig,
}

impl VotingClient {
    /// Load the descriptor and bind the contract
    ///
    /// Fails before anything is rendered when the descriptor is missing or
    /// malformed, or when the contract lacks the ballot members.
    pub fn initialize(
        node: Arc<dyn ChainNode>,
        view: Arc<dyn TallyView>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let store = DescriptorStore::new(&config.descriptor_path);
        let descriptor = store.load().map_err(|e| {
            log::error!("Failed to load {:?}: {}", store.path(), e);
            e
        })?;
        let contract = ContractHandle::from_descriptor(&descriptor)?;

        contract.schema().require(TOTAL_VOTES_METHOD, 1, 1)?;
        contract.schema().require(VOTE_METHOD, 1, 0)?;

        log::info!("Bound ballot contract at {:?}", contract.address());
        Ok(Self {
            node,
            contract,
            view,
            config,
        })
    }

    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.config.registry
    }

    /// Account used when no sender is given explicitly
    pub async fn default_sender(&self) -> Result<Address, ClientError> {
        let lookup = select_account(self.node.as_ref(), self.config.sender_index);
        tokio::time::timeout(self.config.call_timeout, lookup)
            .await
            .map_err(|_| ClientError::CallTimeout(self.config.call_timeout))?
            .map_err(ClientError::Account)
    }

    /// Read the current tally for `candidate` without touching the view
    pub async fn total_votes(&self, candidate: &str) -> Result<String, ClientError> {
        let args = [candidate.to_string()];
        let call = self
            .contract
            .call(self.node.as_ref(), TOTAL_VOTES_METHOD, &args);
        let outputs = tokio::time::timeout(self.config.call_timeout, call)
            .await
            .map_err(|_| ClientError::CallTimeout(self.config.call_timeout))??;

        let tally = outputs.first().ok_or_else(|| CallError::Decode {
            method: TOTAL_VOTES_METHOD.to_string(),
            reason: "empty output".to_string(),
        })?;
        Ok(token_to_text(tally))
    }

    async fn render_one(&self, candidate: &str, location: &str) -> Result<(), ClientError> {
        match self.total_votes(candidate).await {
            Ok(votes) => {
                self.view.show_tally(location, &votes);
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to read tally for {:?}: {}", candidate, e);
                self.view.show_error(location, &e.to_string());
                Err(e)
            }
        }
    }

    /// Re-read every candidate's tally and update its display location
    ///
    /// Reads run concurrently and all complete before returning; a failed read
    /// only marks its own location. The first error, if any, is returned.
    pub async fn render_all(&self) -> Result<usize, ClientError> {
        let reads = self
            .config
            .registry
            .slots()
            .iter()
            .map(|slot| self.render_one(&slot.candidate, &slot.location));
        let results = join_all(reads).await;

        let mut rendered = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(()) => rendered += 1,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(rendered),
        }
    }

    /// Cast a vote for `candidate` signed by `sender`, then refresh its tally
    ///
    /// Unknown candidates are rejected before any RPC call. Votes are never
    /// retried.
    pub async fn vote(&self, candidate: &str, sender: Address) -> Result<String, ClientError> {
        let location = self.config.registry.location(candidate)?.to_string();

        if let Err(e) = self.cast(candidate, sender).await {
            let reason = match e {
                ClientError::VoteFailed { reason, .. } => reason,
                other => other.to_string(),
            };
            log::warn!("Vote for {:?} failed: {}", candidate, reason);
            self.view.show_vote_failed(candidate, &reason);
            return Err(ClientError::VoteFailed {
                candidate: candidate.to_string(),
                reason,
            });
        }

        let votes = self.total_votes(candidate).await?;
        self.view.show_tally(&location, &votes);
        log::info!("Vote for {:?} recorded, tally now {}", candidate, votes);
        Ok(votes)
    }

    async fn cast(&self, candidate: &str, sender: Address) -> Result<(), ClientError> {
        let args = [candidate.to_string()];
        let send = self.contract.send(
            self.node.as_ref(),
            VOTE_METHOD,
            &args,
            sender,
            self.config.gas_limit,
        );
        let tx_hash = tokio::time::timeout(self.config.call_timeout, send)
            .await
            .map_err(|_| ClientError::CallTimeout(self.config.call_timeout))??;
        log::debug!("Vote transaction {:?} submitted", tx_hash);

        let receipt = wait_for_receipt(
            self.node.as_ref(),
            tx_hash,
            self.config.poll_interval,
            self.config.call_timeout,
        )
        .await
        .map_err(|e| match e {
            NodeError::Timeout(after, _) => ClientError::CallTimeout(after),
            other => ClientError::CallError(other.into()),
        })?;

        if !receipt.success {
            return Err(ClientError::VoteFailed {
                candidate: candidate.to_string(),
                reason: format!("transaction {:?} reverted", tx_hash),
            });
        }
        Ok(())
    }
}
