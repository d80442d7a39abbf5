//! In-memory node running the ballot contract, for tests

use crate::rpc::provider::{ChainNode, NodeError, TxReceipt, TxRequest};
use async_trait::async_trait;
use ethers::abi::{Abi, ParamType, Token};
use ethers::types::{Address, Bytes, H256, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// ABI of `contracts/Voting.sol` as emitted by solc
pub const VOTING_ABI: &str = r#"[
  {
    "inputs": [{ "internalType": "bytes32[]", "name": "candidateNames", "type": "bytes32[]" }],
    "stateMutability": "nonpayable",
    "type": "constructor"
  },
  {
    "inputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }],
    "name": "candidateList",
    "outputs": [{ "internalType": "bytes32", "name": "", "type": "bytes32" }],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [{ "internalType": "bytes32", "name": "candidate", "type": "bytes32" }],
    "name": "totalVotesFor",
    "outputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [{ "internalType": "bytes32", "name": "candidate", "type": "bytes32" }],
    "name": "validCandidate",
    "outputs": [{ "internalType": "bool", "name": "", "type": "bool" }],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [{ "internalType": "bytes32", "name": "candidate", "type": "bytes32" }],
    "name": "voteForCandidate",
    "outputs": [],
    "stateMutability": "nonpayable",
    "type": "function"
  },
  {
    "inputs": [{ "internalType": "bytes32", "name": "", "type": "bytes32" }],
    "name": "votesReceived",
    "outputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }],
    "stateMutability": "view",
    "type": "function"
  }
]"#;

/// Stand-in creation bytecode
pub const VOTING_BYTECODE: &str = "608060405234801561001057600080fd5b50";

pub fn voting_abi() -> Abi {
    serde_json::from_str(VOTING_ABI).expect("fixture ABI parses")
}

#[derive(Default)]
struct Ballot {
    candidates: Vec<Vec<u8>>,
    votes: HashMap<Vec<u8>, U256>,
}

#[derive(Default)]
struct MockState {
    tx_count: u64,
    contracts: HashMap<Address, Ballot>,
    /// Receipts and how many more polls return "pending"
    receipts: HashMap<H256, (usize, TxReceipt)>,
}

pub struct MockNode {
    abi: Abi,
    accounts: Vec<Address>,
    state: Mutex<MockState>,
    rpc_calls: AtomicUsize,
    pending_polls: usize,
    never_mine: bool,
    reject_submissions: bool,
    stall_submissions: bool,
    revert_votes: bool,
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            abi: voting_abi(),
            accounts: (1..=3).map(Address::from_low_u64_be).collect(),
            state: Mutex::new(MockState::default()),
            rpc_calls: AtomicUsize::new(0),
            pending_polls: 1,
            never_mine: false,
            reject_submissions: false,
            stall_submissions: false,
            revert_votes: false,
        }
    }

    pub fn never_mine(mut self) -> Self {
        self.never_mine = true;
        self
    }

    pub fn reject_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    /// Transactions are accepted but the submission call never returns
    pub fn stall_submissions(mut self) -> Self {
        self.stall_submissions = true;
        self
    }

    pub fn revert_votes(mut self) -> Self {
        self.revert_votes = true;
        self
    }

    /// Number of RPC methods invoked so far
    pub fn rpc_calls(&self) -> usize {
        self.rpc_calls.load(Ordering::SeqCst)
    }

    /// Deploy a ballot directly, bypassing transactions
    pub fn install_ballot(&self, candidates: &[&str]) -> Address {
        let mut state = self.state.lock().unwrap();
        state.tx_count += 1;
        let address = Address::from_low_u64_be(0xC0DE + state.tx_count);
        let ballot = Ballot {
            candidates: candidates.iter().map(|c| pad32(c.as_bytes())).collect(),
            votes: HashMap::new(),
        };
        state.contracts.insert(address, ballot);
        address
    }

    fn next_hash(state: &mut MockState) -> H256 {
        state.tx_count += 1;
        H256::from_low_u64_be(state.tx_count)
    }

    fn dispatch(&self, data: &[u8]) -> Result<(String, Vec<Token>), NodeError> {
        if data.len() < 4 {
            return Err(NodeError::Rpc("calldata too short".to_string()));
        }
        let function = self
            .abi
            .functions()
            .find(|f| f.short_signature() == data[..4])
            .ok_or_else(|| NodeError::Rpc("execution reverted: no such selector".to_string()))?;
        let args = function
            .decode_input(&data[4..])
            .map_err(|e| NodeError::Rpc(e.to_string()))?;
        Ok((function.name.clone(), args))
    }
}

fn pad32(bytes: &[u8]) -> Vec<u8> {
    let mut padded = vec![0u8; 32];
    padded[..bytes.len()].copy_from_slice(bytes);
    padded
}

fn candidate_arg(args: &[Token]) -> Vec<u8> {
    match args.first() {
        Some(Token::FixedBytes(bytes)) => bytes.clone(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl ChainNode for MockNode {
    async fn accounts(&self) -> Result<Vec<Address>, NodeError> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.clone())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<H256, NodeError> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_submissions {
            std::future::pending::<()>().await;
        }
        if self.reject_submissions || !self.accounts.contains(&tx.from) {
            return Err(NodeError::Rpc("sender account not recognized".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let tx_hash = Self::next_hash(&mut state);

        let receipt = match tx.to {
            None => {
                let code = hex::decode(VOTING_BYTECODE).unwrap();
                let rest = tx.data.as_ref().strip_prefix(code.as_slice()).unwrap_or(&[]);
                let params = [ParamType::Array(Box::new(ParamType::FixedBytes(32)))];
                let candidates = match ethers::abi::decode(&params, rest) {
                    Ok(mut tokens) => match tokens.pop() {
                        Some(Token::Array(items)) => items
                            .into_iter()
                            .filter_map(|t| t.into_fixed_bytes())
                            .collect(),
                        _ => Vec::new(),
                    },
                    Err(_) => Vec::new(),
                };
                let address = Address::from_low_u64_be(0xC0DE + state.tx_count);
                state.contracts.insert(
                    address,
                    Ballot {
                        candidates,
                        votes: HashMap::new(),
                    },
                );
                TxReceipt {
                    tx_hash,
                    contract_address: Some(address),
                    block_number: Some(state.tx_count),
                    success: true,
                }
            }
            Some(to) => {
                let (name, args) = self.dispatch(tx.data.as_ref())?;
                let ballot = state
                    .contracts
                    .get_mut(&to)
                    .ok_or_else(|| NodeError::Rpc(format!("no contract at {:?}", to)))?;
                let candidate = candidate_arg(&args);
                let success = name == "voteForCandidate"
                    && !self.revert_votes
                    && ballot.candidates.contains(&candidate);
                if success {
                    *ballot.votes.entry(candidate).or_default() += U256::one();
                }
                TxReceipt {
                    tx_hash,
                    contract_address: None,
                    block_number: Some(state.tx_count),
                    success,
                }
            }
        };

        state.receipts.insert(tx_hash, (self.pending_polls, receipt));
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, NodeError> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        if self.never_mine {
            return Ok(None);
        }
        let mut state = self.state.lock().unwrap();
        match state.receipts.get_mut(&tx_hash) {
            Some((0, receipt)) => Ok(Some(receipt.clone())),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, NodeError> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        let (name, args) = self.dispatch(data.as_ref())?;
        let state = self.state.lock().unwrap();
        let ballot = state
            .contracts
            .get(&to)
            .ok_or_else(|| NodeError::Rpc(format!("no contract at {:?}", to)))?;
        let candidate = candidate_arg(&args);
        let valid = ballot.candidates.contains(&candidate);

        let output = match name.as_str() {
            "totalVotesFor" if valid => {
                Token::Uint(ballot.votes.get(&candidate).copied().unwrap_or_default())
            }
            "votesReceived" => {
                Token::Uint(ballot.votes.get(&candidate).copied().unwrap_or_default())
            }
            "validCandidate" => Token::Bool(valid),
            _ => return Err(NodeError::Rpc("execution reverted".to_string())),
        };
        Ok(Bytes::from(ethers::abi::encode(&[output])))
    }
}
