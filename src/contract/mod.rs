//! Smart contract module
//!
//! Compilation, interface schema and bound handles for Solidity contracts.
//!
//! # Example
//!
//! ```no_run
//! use voting_dapp::contract::{ContractCompiler, ContractSource, SolcCompiler};
//!
//! let source = ContractSource::read("contracts/Voting.sol").unwrap();
//! let artifact = SolcCompiler::new().compile(&source, "Voting").unwrap();
//! println!("{} bytes of bytecode", artifact.bytecode.len() / 2);
//! ```

pub mod abi;
pub mod compiler;
pub mod handle;

pub use abi::{text_to_token, token_to_text, AbiError, InterfaceSchema, Method};
pub use compiler::{CompileError, CompiledArtifact, ContractCompiler, ContractSource, SolcCompiler};
pub use handle::{CallError, ContractHandle};
