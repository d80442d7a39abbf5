//! Ethereum node access
//!
//! The deployer and the voting client only talk to the chain through the
//! [`ChainNode`] trait. [`HttpNode`] implements it over JSON-RPC.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod provider;

pub use http::HttpNode;
pub use provider::{select_account, wait_for_receipt, ChainNode, NodeError, TxReceipt, TxRequest};
