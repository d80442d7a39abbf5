//! Deployment descriptor persistence
//!
//! The descriptor is the only artifact shared between the deployer and the
//! client: a JSON document with exactly two fields, `address` and `abi`
//! (the ABI itself serialized as a JSON string).

use ethers::abi::Abi;
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default descriptor location
pub const DEFAULT_DESCRIPTOR_PATH: &str = "./contract.json";

/// Descriptor errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Descriptor not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed descriptor: {0}")]
    Malformed(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// `{address, abi}` of a mined contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentDescriptor {
    /// Checksummed contract address
    pub address: String,
    /// ABI as pretty-printed JSON text
    pub abi: String,
}

impl DeploymentDescriptor {
    /// Build a descriptor for a contract mined at `address`
    pub fn new(address: Address, abi: &Abi) -> Result<Self, DescriptorError> {
        if address.is_zero() {
            return Err(DescriptorError::Malformed(
                "contract address is empty".to_string(),
            ));
        }
        Ok(Self {
            address: to_checksum(&address, None),
            abi: serde_json::to_string_pretty(abi)?,
        })
    }

    /// Parse the address field
    pub fn contract_address(&self) -> Result<Address, DescriptorError> {
        self.address
            .parse::<Address>()
            .map_err(|e| DescriptorError::Malformed(format!("address {:?}: {}", self.address, e)))
    }

    /// Parse the abi field back into structured form
    pub fn parse_abi(&self) -> Result<Abi, DescriptorError> {
        serde_json::from_str(&self.abi)
            .map_err(|e| DescriptorError::Malformed(format!("abi field: {}", e)))
    }

    /// Check both fields parse
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let address = self.contract_address()?;
        if address.is_zero() {
            return Err(DescriptorError::Malformed(
                "contract address is empty".to_string(),
            ));
        }
        self.parse_abi()?;
        Ok(())
    }
}

/// Reads and writes the descriptor at a fixed path
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    path: PathBuf,
}

impl DescriptorStore {
    /// Store rooted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the descriptor file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a descriptor has been written
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the descriptor, replacing any previous content
    pub fn save(&self, descriptor: &DeploymentDescriptor) -> Result<(), DescriptorError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write to temporary file first
        let temp_path = self.path.with_extension("json.tmp");
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, descriptor)?;
        writer.flush()?;
        drop(writer);

        // Atomic rename
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Load and validate the descriptor
    pub fn load(&self) -> Result<DeploymentDescriptor, DescriptorError> {
        if !self.path.exists() {
            return Err(DescriptorError::NotFound(self.path.clone()));
        }
        let data = fs::read_to_string(&self.path)?;
        let descriptor = parse_descriptor(&data)?;
        Ok(descriptor)
    }
}

/// Parse and validate descriptor JSON text
pub fn parse_descriptor(data: &str) -> Result<DeploymentDescriptor, DescriptorError> {
    let descriptor: DeploymentDescriptor =
        serde_json::from_str(data).map_err(|e| DescriptorError::Malformed(e.to_string()))?;
    descriptor.validate()?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::InterfaceSchema;
    use crate::rpc::mock::voting_abi;
    use tempfile::tempdir;

    fn sample() -> DeploymentDescriptor {
        DeploymentDescriptor::new(Address::from_low_u64_be(0xC0DE), &voting_abi()).unwrap()
    }

    #[test]
    fn test_descriptor_fields() {
        let descriptor = sample();
        assert!(descriptor.address.starts_with("0x"));
        assert_eq!(descriptor.address.len(), 42);
        assert!(descriptor.abi.contains("\n  "));

        let json = serde_json::to_value(&descriptor).unwrap();
        let fields: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(fields, vec!["abi", "address"]);
    }

    #[test]
    fn test_zero_address_rejected() {
        let result = DeploymentDescriptor::new(Address::zero(), &voting_abi());
        assert!(matches!(result, Err(DescriptorError::Malformed(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path().join("contract.json"));
        assert!(!store.exists());

        let descriptor = sample();
        store.save(&descriptor).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, descriptor);
        assert_eq!(
            loaded.contract_address().unwrap(),
            Address::from_low_u64_be(0xC0DE)
        );
    }

    #[test]
    fn test_abi_survives_storage() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path().join("contract.json"));
        store.save(&sample()).unwrap();

        let abi = store.load().unwrap().parse_abi().unwrap();
        assert_eq!(
            InterfaceSchema::from_abi(&abi),
            InterfaceSchema::from_abi(&voting_abi())
        );
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contract.json");
        fs::write(&path, "x".repeat(10_000)).unwrap();

        let store = DescriptorStore::new(&path);
        store.save(&sample()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());
        assert!(!dir.path().join("contract.json.tmp").exists());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let store = DescriptorStore::new(dir.path().join("missing.json"));
        assert!(matches!(store.load(), Err(DescriptorError::NotFound(_))));
    }

    #[test]
    fn test_load_malformed() {
        assert!(matches!(
            parse_descriptor("{\"address\": 5}"),
            Err(DescriptorError::Malformed(_))
        ));
        assert!(matches!(
            parse_descriptor(r#"{"address": "0xnothex", "abi": "[]"}"#),
            Err(DescriptorError::Malformed(_))
        ));
        assert!(matches!(
            parse_descriptor(
                r#"{"address": "0x000000000000000000000000000000000000c0de", "abi": "oops"}"#
            ),
            Err(DescriptorError::Malformed(_))
        ));
        assert!(parse_descriptor(
            r#"{"address": "0x000000000000000000000000000000000000c0de", "abi": "[]"}"#
        )
        .is_ok());
    }
}
