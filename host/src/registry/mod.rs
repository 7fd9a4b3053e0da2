//! Registration adapters
//!
//! The registry is the durable map `combined hash -> (creator, timestamp,
//! storage link)`, plus a secondary index from output hash to the combined
//! hashes that were registered for it. Writes are atomic and reject duplicate
//! fingerprints; callers surface the conflict instead of retrying.

use std::sync::Arc;

use async_trait::async_trait;
use poa_core::ProofRecord;
use serde::{Deserialize, Serialize};

use crate::config::{RegistryBackend, RegistryConfig};
use crate::error::Result;

pub mod ethereum;
pub mod memory;

pub use ethereum::EthereumRegistry;
pub use memory::MemoryRegistry;

/// A proof together with where its artwork was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub proof: ProofRecord,
    pub storage_link: String,
}

impl Registration {
    pub fn new(proof: ProofRecord, storage_link: impl Into<String>) -> Self {
        Self {
            proof,
            storage_link: storage_link.into(),
        }
    }
}

/// What the registry returns for a known fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredProof {
    pub creator_id: String,
    pub timestamp: u64,
    pub storage_link: String,
}

#[async_trait]
pub trait Registry: Send + Sync {
    /// Persist a registration, returning the transaction id.
    /// Fails with `PoaError::Conflict` if the combined hash is already known.
    async fn register(&self, registration: &Registration) -> Result<String>;

    /// `None` covers both "never registered" and "not final yet".
    async fn lookup(&self, combined_hash: &str) -> Result<Option<RegisteredProof>>;

    /// Combined hashes registered for an output hash, oldest first
    async fn lookup_by_output_hash(&self, output_hash: &str) -> Result<Vec<String>>;
}

pub fn build(config: &RegistryConfig) -> Result<Arc<dyn Registry>> {
    Ok(match config.backend {
        RegistryBackend::Ethereum => Arc::new(EthereumRegistry::new(config)?),
        RegistryBackend::Memory => Arc::new(MemoryRegistry::new()),
    })
}
