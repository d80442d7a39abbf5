//! Candidate registry
//!
//! Static mapping from candidate identifier to the display location showing
//! its tally. Identifiers match exactly: no trimming, no case folding.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown candidate: {0:?}")]
    UnknownCandidate(String),
    #[error("Duplicate candidate: {0:?}")]
    Duplicate(String),
    #[error("Invalid registry entry {0:?}, expected <candidate>:<location>")]
    InvalidEntry(String),
}

/// One candidate and where its tally is displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSlot {
    pub candidate: String,
    pub location: String,
}

/// Ordered candidate → display-location mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRegistry {
    slots: Vec<CandidateSlot>,
}

impl CandidateRegistry {
    /// Build from explicit pairs
    pub fn from_pairs<I, C, L>(pairs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (C, L)>,
        C: Into<String>,
        L: Into<String>,
    {
        let mut slots: Vec<CandidateSlot> = Vec::new();
        for (candidate, location) in pairs {
            let candidate = candidate.into();
            if slots.iter().any(|s| s.candidate == candidate) {
                return Err(RegistryError::Duplicate(candidate));
            }
            slots.push(CandidateSlot {
                candidate,
                location: location.into(),
            });
        }
        Ok(Self { slots })
    }

    /// Locations `candidate-1`, `candidate-2`, ... in the order given
    pub fn numbered<I, C>(candidates: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::from_pairs(
            candidates
                .into_iter()
                .enumerate()
                .map(|(i, c)| (c.into(), format!("candidate-{}", i + 1))),
        )
    }

    /// Parse `<candidate>:<location>` entries; the last `:` separates them
    pub fn parse_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, RegistryError> {
        let pairs = entries
            .iter()
            .map(|entry| {
                let entry = entry.as_ref();
                match entry.rsplit_once(':') {
                    Some((candidate, location)) if !candidate.is_empty() && !location.is_empty() => {
                        Ok((candidate.to_string(), location.to_string()))
                    }
                    _ => Err(RegistryError::InvalidEntry(entry.to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(pairs)
    }

    /// Display location for `candidate`
    pub fn location(&self, candidate: &str) -> Result<&str, RegistryError> {
        self.slots
            .iter()
            .find(|s| s.candidate == candidate)
            .map(|s| s.location.as_str())
            .ok_or_else(|| RegistryError::UnknownCandidate(candidate.to_string()))
    }

    pub fn slots(&self) -> &[CandidateSlot] {
        &self.slots
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.candidate.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        Self {
            slots: vec![
                CandidateSlot {
                    candidate: "==".to_string(),
                    location: "candidate-1".to_string(),
                },
                CandidateSlot {
                    candidate: "= =".to_string(),
                    location: "candidate-2".to_string(),
                },
            ],
        }
    }
}

impl fmt::Display for CandidateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .slots
            .iter()
            .map(|s| format!("{:?} → {}", s.candidate, s.location))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
