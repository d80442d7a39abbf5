//! Typed interface schema
//!
//! Validates a parsed ABI once, at bind time, into a table of callable
//! members. Calls to members the contract does not declare fail with
//! [`AbiError::UnknownMethod`] before anything is sent to the node.

use ethers::abi::{Abi, Function, ParamType, StateMutability, Token};
use ethers::types::{Address, U256};
use std::collections::BTreeMap;
use thiserror::Error;

/// ABI errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbiError {
    #[error("Invalid ABI: {0}")]
    Invalid(String),
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
    #[error("{method} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        method: String,
        expected: usize,
        got: usize,
    },
    #[error("Cannot encode {value:?} as {kind}: {reason}")]
    InvalidArgument {
        kind: String,
        value: String,
        reason: String,
    },
    #[error("Unsupported parameter type: {0}")]
    UnsupportedType(String),
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// One callable member of a contract
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub inputs: Vec<ParamType>,
    pub outputs: Vec<ParamType>,
    pub mutability: StateMutability,
}

impl Method {
    /// Whether calling this member changes contract state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self.mutability,
            StateMutability::NonPayable | StateMutability::Payable
        )
    }
}

impl From<&Function> for Method {
    fn from(function: &Function) -> Self {
        Self {
            name: function.name.clone(),
            inputs: function.inputs.iter().map(|p| p.kind.clone()).collect(),
            outputs: function.outputs.iter().map(|p| p.kind.clone()).collect(),
            mutability: function.state_mutability,
        }
    }
}

/// Named callable members of a contract
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceSchema {
    methods: BTreeMap<String, Method>,
    constructor: Vec<ParamType>,
}

impl InterfaceSchema {
    /// Build the schema from a parsed ABI
    ///
    /// Overloaded functions keep their first declaration.
    pub fn from_abi(abi: &Abi) -> Self {
        let methods = abi
            .functions
            .iter()
            .filter_map(|(name, overloads)| {
                overloads
                    .first()
                    .map(|function| (name.clone(), Method::from(function)))
            })
            .collect();
        let constructor = abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.iter().map(|p| p.kind.clone()).collect())
            .unwrap_or_default();

        Self {
            methods,
            constructor,
        }
    }

    /// Parse ABI JSON text into a schema
    pub fn parse(abi_json: &str) -> Result<(Abi, Self), AbiError> {
        let abi: Abi =
            serde_json::from_str(abi_json).map_err(|e| AbiError::Invalid(e.to_string()))?;
        let schema = Self::from_abi(&abi);
        Ok((abi, schema))
    }

    /// Look up a member by name
    pub fn method(&self, name: &str) -> Result<&Method, AbiError> {
        self.methods
            .get(name)
            .ok_or_else(|| AbiError::UnknownMethod(name.to_string()))
    }

    /// Require a member with the given input/output arity
    pub fn require(&self, name: &str, inputs: usize, outputs: usize) -> Result<&Method, AbiError> {
        let method = self.method(name)?;
        if method.inputs.len() != inputs || method.outputs.len() != outputs {
            return Err(AbiError::Invalid(format!(
                "{} declares {} input(s) and {} output(s), expected {} and {}",
                name,
                method.inputs.len(),
                method.outputs.len(),
                inputs,
                outputs
            )));
        }
        Ok(method)
    }

    /// Names of all members
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Constructor parameter types
    pub fn constructor_inputs(&self) -> &[ParamType] {
        &self.constructor
    }
}

/// Convert a text value into a token of the given ABI type
pub fn text_to_token(kind: &ParamType, value: &str) -> Result<Token, AbiError> {
    let invalid = |reason: String| AbiError::InvalidArgument {
        kind: kind.to_string(),
        value: value.to_string(),
        reason,
    };

    match kind {
        ParamType::String => Ok(Token::String(value.to_string())),
        ParamType::FixedBytes(size) => {
            let bytes = value.as_bytes();
            if bytes.len() > *size {
                return Err(invalid(format!("longer than {} bytes", size)));
            }
            let mut padded = vec![0u8; *size];
            padded[..bytes.len()].copy_from_slice(bytes);
            Ok(Token::FixedBytes(padded))
        }
        ParamType::Bytes => Ok(Token::Bytes(value.as_bytes().to_vec())),
        ParamType::Uint(_) => {
            let parsed = match value.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| format!("{:?}", e)),
                None => U256::from_dec_str(value).map_err(|e| format!("{:?}", e)),
            };
            parsed.map(Token::Uint).map_err(invalid)
        }
        ParamType::Bool => match value {
            "true" => Ok(Token::Bool(true)),
            "false" => Ok(Token::Bool(false)),
            _ => Err(invalid("expected true or false".to_string())),
        },
        ParamType::Address => value
            .parse::<Address>()
            .map(Token::Address)
            .map_err(|e| invalid(e.to_string())),
        other => Err(AbiError::UnsupportedType(other.to_string())),
    }
}

/// Convert text arguments into tokens for a parameter list
///
/// A parameter list holding a single array takes every value as an element
/// of that array; otherwise values map one to one onto parameters.
pub fn shape_arguments(
    context: &str,
    params: &[ParamType],
    values: &[String],
) -> Result<Vec<Token>, AbiError> {
    if let [ParamType::Array(inner)] = params {
        let elements = values
            .iter()
            .map(|v| text_to_token(inner, v))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(vec![Token::Array(elements)]);
    }
    if let [ParamType::FixedArray(inner, len)] = params {
        if values.len() != *len {
            return Err(AbiError::ArityMismatch {
                method: context.to_string(),
                expected: *len,
                got: values.len(),
            });
        }
        let elements = values
            .iter()
            .map(|v| text_to_token(inner, v))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(vec![Token::FixedArray(elements)]);
    }

    if params.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            method: context.to_string(),
            expected: params.len(),
            got: values.len(),
        });
    }
    params
        .iter()
        .zip(values)
        .map(|(kind, value)| text_to_token(kind, value))
        .collect()
}

/// Render a decoded token for display
pub fn token_to_text(token: &Token) -> String {
    match token {
        Token::Uint(value) | Token::Int(value) => value.to_string(),
        Token::Bool(value) => value.to_string(),
        Token::String(value) => value.clone(),
        Token::Address(address) => format!("{:?}", address),
        Token::FixedBytes(bytes) => {
            let trimmed: Vec<u8> = bytes.iter().copied().take_while(|b| *b != 0).collect();
            match String::from_utf8(trimmed) {
                Ok(text) => text,
                Err(_) => format!("0x{}", hex::encode(bytes)),
            }
        }
        Token::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            let inner: Vec<String> = items.iter().map(token_to_text).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::{voting_abi, VOTING_ABI};

    #[test]
    fn test_schema_from_voting_abi() {
        let (_, schema) = InterfaceSchema::parse(VOTING_ABI).unwrap();

        let total = schema.method("totalVotesFor").unwrap();
        assert_eq!(total.inputs, vec![ParamType::FixedBytes(32)]);
        assert_eq!(total.outputs, vec![ParamType::Uint(256)]);
        assert!(!total.is_mutating());

        let vote = schema.method("voteForCandidate").unwrap();
        assert!(vote.is_mutating());
        assert!(vote.outputs.is_empty());

        assert_eq!(
            schema.constructor_inputs(),
            &[ParamType::Array(Box::new(ParamType::FixedBytes(32)))]
        );
    }

    #[test]
    fn test_unknown_method() {
        let schema = InterfaceSchema::from_abi(&voting_abi());
        assert_eq!(
            schema.method("transferOwnership").unwrap_err(),
            AbiError::UnknownMethod("transferOwnership".to_string())
        );
        assert!(schema.require("totalVotesFor", 1, 1).is_ok());
        assert!(matches!(
            schema.require("totalVotesFor", 2, 1),
            Err(AbiError::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_abi_text() {
        assert!(matches!(
            InterfaceSchema::parse("{not json"),
            Err(AbiError::Invalid(_))
        ));
    }

    #[test]
    fn test_fixed_bytes_padding() {
        let token = text_to_token(&ParamType::FixedBytes(32), "= =").unwrap();
        match token {
            Token::FixedBytes(bytes) => {
                assert_eq!(bytes.len(), 32);
                assert_eq!(&bytes[..3], b"= =");
                assert!(bytes[3..].iter().all(|b| *b == 0));
            }
            other => panic!("unexpected token {:?}", other),
        }

        let long = "x".repeat(33);
        assert!(matches!(
            text_to_token(&ParamType::FixedBytes(32), &long),
            Err(AbiError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(
            text_to_token(&ParamType::Uint(256), "42").unwrap(),
            Token::Uint(U256::from(42))
        );
        assert_eq!(
            text_to_token(&ParamType::Uint(8), "0x10").unwrap(),
            Token::Uint(U256::from(16))
        );
        assert_eq!(
            text_to_token(&ParamType::Bool, "true").unwrap(),
            Token::Bool(true)
        );
        assert!(text_to_token(&ParamType::Uint(256), "many").is_err());
        assert!(matches!(
            text_to_token(&ParamType::Tuple(vec![]), "x"),
            Err(AbiError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_shape_array_constructor() {
        let params = vec![ParamType::Array(Box::new(ParamType::FixedBytes(32)))];
        let values = vec!["==".to_string(), "= =".to_string()];
        let tokens = shape_arguments("constructor", &params, &values).unwrap();

        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::Array(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn test_shape_arity_checked() {
        let params = vec![ParamType::String, ParamType::Uint(256)];
        let err = shape_arguments("register", &params, &["only-one".to_string()]).unwrap_err();
        assert_eq!(
            err,
            AbiError::ArityMismatch {
                method: "register".to_string(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_token_to_text() {
        assert_eq!(token_to_text(&Token::Uint(U256::from(7))), "7");
        let name = text_to_token(&ParamType::FixedBytes(32), "==").unwrap();
        assert_eq!(token_to_text(&name), "==");
    }
}
