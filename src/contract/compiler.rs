//! Solidity compilation
//!
//! Turns contract source text into a [`CompiledArtifact`] (bytecode + ABI).
//! The compiler itself is external; [`SolcCompiler`] drives the `solc`
//! binary through ethers-solc.

use ethers::abi::Abi;
use ethers::solc::artifacts::{CompilerInput, CompilerOutput, Source, Sources};
use ethers::solc::Solc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Compiler errors
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to read contract source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Compiler invocation failed: {0}")]
    Solc(String),
    #[error("Compiler reported errors:\n{}", .0.join("\n"))]
    Diagnostics(Vec<String>),
    #[error("Contract not found in compiler output: {0}")]
    ContractNotFound(String),
    #[error("Contract {0} has no ABI in compiler output")]
    MissingAbi(String),
    #[error("Contract {0} compiled to empty bytecode")]
    EmptyBytecode(String),
    #[error("Invalid bytecode hex: {0}")]
    InvalidBytecode(#[from] hex::FromHexError),
}

/// Raw contract source text and where it came from
#[derive(Debug, Clone)]
pub struct ContractSource {
    pub path: PathBuf,
    pub text: String,
}

impl ContractSource {
    /// Read a contract source file
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| CompileError::SourceUnreadable {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, text })
    }
}

/// Output of compiling one contract
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    /// Contract name inside the source unit
    pub contract_name: String,
    /// Creation bytecode, hex encoded without `0x`
    pub bytecode: String,
    /// Interface description
    pub abi: Abi,
}

impl CompiledArtifact {
    /// Build an artifact, rejecting empty bytecode
    pub fn new(
        contract_name: impl Into<String>,
        bytecode: impl AsRef<str>,
        abi: Abi,
    ) -> Result<Self, CompileError> {
        let contract_name = contract_name.into();
        let bytecode = bytecode.as_ref().trim().trim_start_matches("0x").to_string();
        if bytecode.is_empty() {
            return Err(CompileError::EmptyBytecode(contract_name));
        }
        // Unlinked libraries leave placeholders that are not valid hex
        hex::decode(&bytecode)?;
        Ok(Self {
            contract_name,
            bytecode,
            abi,
        })
    }

    /// Decode the bytecode into raw bytes
    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, CompileError> {
        Ok(hex::decode(&self.bytecode)?)
    }

    /// ABI as pretty-printed JSON (2-space indent)
    pub fn abi_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.abi)
    }
}

/// Anything that can turn source text into a compiled contract
pub trait ContractCompiler: Send + Sync {
    /// Compile `source` and return the artifact for `contract_name`
    fn compile(
        &self,
        source: &ContractSource,
        contract_name: &str,
    ) -> Result<CompiledArtifact, CompileError>;
}

/// Compiler backed by the `solc` binary
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    solc: Solc,
}

impl SolcCompiler {
    /// Use `solc` from `SOLC_PATH` or `$PATH`
    pub fn new() -> Self {
        Self {
            solc: Solc::default(),
        }
    }

    /// Use a specific `solc` executable
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            solc: Solc::new(path.into()),
        }
    }
}

impl SolcCompiler {
    /// Standard-JSON compile of the text already read, keyed by its path
    fn compile_text(&self, source: &ContractSource) -> Result<CompilerOutput, CompileError> {
        let mut sources = Sources::new();
        sources.insert(source.path.clone(), Source::new(source.text.as_str()));

        let mut output = CompilerOutput::default();
        for input in CompilerInput::with_sources(sources) {
            let unit = self
                .solc
                .compile(&input)
                .map_err(|e| CompileError::Solc(e.to_string()))?;
            output.merge(unit);
        }
        Ok(output)
    }
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractCompiler for SolcCompiler {
    fn compile(
        &self,
        source: &ContractSource,
        contract_name: &str,
    ) -> Result<CompiledArtifact, CompileError> {
        let output = self.compile_text(source)?;

        if output.has_error() {
            let diagnostics = output
                .errors
                .iter()
                .filter(|e| e.severity.is_error())
                .map(|e| e.to_string())
                .collect();
            return Err(CompileError::Diagnostics(diagnostics));
        }

        for warning in output.errors.iter().filter(|e| !e.severity.is_error()) {
            log::warn!("solc: {}", warning);
        }

        let contract = output
            .find(contract_name)
            .ok_or_else(|| CompileError::ContractNotFound(contract_name.to_string()))?;
        let abi = contract
            .abi
            .cloned()
            .ok_or_else(|| CompileError::MissingAbi(contract_name.to_string()))?;
        let bytecode = contract
            .bin
            .and_then(|bin| bin.as_bytes())
            .map(|bytes| hex::encode(bytes.as_ref()))
            .unwrap_or_default();

        CompiledArtifact::new(contract_name, bytecode, abi)
    }
}

/// Compiler returning a fixed artifact, for tests
#[cfg(test)]
pub(crate) struct FixedCompiler(pub Result<CompiledArtifact, String>);

#[cfg(test)]
impl ContractCompiler for FixedCompiler {
    fn compile(
        &self,
        _source: &ContractSource,
        _contract_name: &str,
    ) -> Result<CompiledArtifact, CompileError> {
        match &self.0 {
            Ok(artifact) => Ok(artifact.clone()),
            Err(message) => Err(CompileError::Diagnostics(vec![message.clone()])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::voting_abi;
    use std::io::Write;

    #[test]
    fn test_artifact_strips_prefix() {
        let artifact = CompiledArtifact::new("Voting", "0x6080", voting_abi()).unwrap();
        assert_eq!(artifact.bytecode, "6080");
        assert_eq!(artifact.bytecode_bytes().unwrap(), vec![0x60, 0x80]);
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let err = CompiledArtifact::new("Voting", "", voting_abi()).unwrap_err();
        assert!(matches!(err, CompileError::EmptyBytecode(name) if name == "Voting"));

        let err = CompiledArtifact::new("Voting", "0x", voting_abi()).unwrap_err();
        assert!(matches!(err, CompileError::EmptyBytecode(_)));
    }

    #[test]
    fn test_unlinked_bytecode_rejected() {
        let err = CompiledArtifact::new("Voting", "6080__$lib$__", voting_abi()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidBytecode(_)));
    }

    #[test]
    fn test_abi_json_is_pretty() {
        let artifact = CompiledArtifact::new("Voting", "6080", voting_abi()).unwrap();
        let json = artifact.abi_json().unwrap();
        assert!(json.contains("\n  "));
        let parsed: Abi = serde_json::from_str(&json).unwrap();
        assert!(parsed.function("totalVotesFor").is_ok());
    }

    #[test]
    fn test_solc_compiles_loaded_text() {
        // Path does not exist on disk; only the loaded text is handed to solc
        let source = ContractSource {
            path: PathBuf::from("/not/on/disk/Voting.sol"),
            text: "contract Voting {}".to_string(),
        };
        let compiler = SolcCompiler::with_path("/not/installed/solc");

        match compiler.compile(&source, "Voting") {
            Err(CompileError::Solc(message)) => assert!(!message.contains("Voting.sol")),
            other => panic!("unexpected result {:?}", other.map(|a| a.contract_name)),
        }
    }

    #[test]
    fn test_read_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "contract Voting {{}}").unwrap();

        let source = ContractSource::read(file.path()).unwrap();
        assert_eq!(source.text, "contract Voting {}");

        let missing = ContractSource::read("/definitely/not/here.sol");
        assert!(matches!(
            missing,
            Err(CompileError::SourceUnreadable { .. })
        ));
    }
}
