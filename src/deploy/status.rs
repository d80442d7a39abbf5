//! Two-phase deployment notifications
//!
//! A contract-creation transaction is first accepted into the pending pool
//! (only its hash is known) and later mined (its contract address is known).
//! [`DeploymentSubscription`] delivers both phases in order; dropping it
//! cancels the watcher.

use crate::deploy::deployer::DeployError;
use ethers::types::{Address, H256};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Observable phase of a contract-creation transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Accepted into the pending pool, not mined
    Pending { tx_hash: H256 },
    /// Mined; the contract address is authoritative
    Mined {
        tx_hash: H256,
        address: Address,
        block_number: Option<u64>,
    },
}

impl DeploymentStatus {
    pub fn tx_hash(&self) -> H256 {
        match self {
            DeploymentStatus::Pending { tx_hash } | DeploymentStatus::Mined { tx_hash, .. } => {
                *tx_hash
            }
        }
    }

    pub fn is_mined(&self) -> bool {
        matches!(self, DeploymentStatus::Mined { .. })
    }
}

/// Stream of [`DeploymentStatus`] updates for one transaction
pub struct DeploymentSubscription {
    receiver: mpsc::Receiver<Result<DeploymentStatus, DeployError>>,
    watcher: JoinHandle<()>,
}

impl DeploymentSubscription {
    pub(crate) fn new(
        receiver: mpsc::Receiver<Result<DeploymentStatus, DeployError>>,
        watcher: JoinHandle<()>,
    ) -> Self {
        Self { receiver, watcher }
    }

    /// Next update, `None` once the watcher has finished
    pub async fn next(&mut self) -> Option<Result<DeploymentStatus, DeployError>> {
        self.receiver.recv().await
    }

    /// Wait for the mined phase, skipping pending updates
    pub async fn mined(mut self) -> Result<DeploymentStatus, DeployError> {
        while let Some(update) = self.next().await {
            let status = update?;
            if status.is_mined() {
                return Ok(status);
            }
        }
        Err(DeployError::SubmissionError(
            "deployment watcher stopped before the transaction was mined".to_string(),
        ))
    }

    /// Stop watching the transaction
    pub fn cancel(self) {
        self.watcher.abort();
    }
}

impl Drop for DeploymentSubscription {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
