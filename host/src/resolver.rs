//! Verification resolver
//!
//! A verification request is resolved either directly by combined hash, or
//! from artwork bytes through the registry's output-hash index. Lookups are
//! single synchronous reads: "not final yet" reports as `NotFound` and any
//! polling belongs to the caller.

use std::sync::Arc;

use poa_core::digest_bytes;
use serde::Serialize;
use tracing::debug;

use crate::error::{PoaError, Result};
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyQuery {
    ByHash(String),
    ByBytes(Vec<u8>),
}

/// Public view of a registered proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedProof {
    pub combined_hash: String,
    pub creator_id: String,
    pub timestamp: u64,
    pub storage_link: String,
}

#[derive(Clone)]
pub struct Resolver {
    registry: Arc<dyn Registry>,
}

impl Resolver {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    pub async fn resolve(&self, query: VerifyQuery) -> Result<VerifiedProof> {
        match query {
            VerifyQuery::ByHash(hash) => self.verify_by_hash(&hash).await,
            VerifyQuery::ByBytes(bytes) => self.verify_by_bytes(&bytes).await,
        }
    }

    pub async fn verify_by_hash(&self, combined_hash: &str) -> Result<VerifiedProof> {
        let combined_hash = normalize_hash(combined_hash)?;
        debug!("Resolving by hash {}", combined_hash);

        match self.registry.lookup(&combined_hash).await? {
            Some(found) => Ok(VerifiedProof {
                combined_hash,
                creator_id: found.creator_id,
                timestamp: found.timestamp,
                storage_link: found.storage_link,
            }),
            None => Err(PoaError::NotFound(combined_hash)),
        }
    }

    pub async fn verify_by_bytes(&self, bytes: &[u8]) -> Result<VerifiedProof> {
        if bytes.is_empty() {
            return Err(PoaError::Input("file is empty".to_string()));
        }

        let output_hash = digest_bytes(bytes);
        debug!("Resolving by output hash {}", output_hash);

        let mut candidates = self.registry.lookup_by_output_hash(&output_hash).await?;
        match candidates.len() {
            0 => Err(PoaError::NotFound(output_hash)),
            1 => {
                let combined_hash = candidates.remove(0);
                self.verify_by_hash(&combined_hash).await
            }
            _ => Err(PoaError::Ambiguous {
                output_hash,
                candidates,
            }),
        }
    }
}

fn normalize_hash(hash: &str) -> Result<String> {
    let hash = hash.trim();
    if hash.is_empty() {
        return Err(PoaError::Input("combined hash is empty".to_string()));
    }
    Ok(hash.to_ascii_lowercase())
}
