use std::collections::HashMap;

use async_trait::async_trait;
use poa_core::digest_string;
use tokio::sync::Mutex;
use tracing::debug;

use super::{RegisteredProof, Registration, Registry};
use crate::error::{PoaError, Result};

/// In-process registry for development and tests
#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    proofs: HashMap<String, RegisteredProof>,
    by_output: HashMap<String, Vec<String>>,
    sequence: u64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.proofs.len()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn register(&self, registration: &Registration) -> Result<String> {
        let proof = &registration.proof;
        let mut state = self.state.lock().await;

        // check and insert under one lock
        if state.proofs.contains_key(proof.combined_hash()) {
            return Err(PoaError::Conflict(proof.combined_hash().to_string()));
        }

        state.proofs.insert(
            proof.combined_hash().to_string(),
            RegisteredProof {
                creator_id: proof.creator_id().to_string(),
                timestamp: proof.timestamp(),
                storage_link: registration.storage_link.clone(),
            },
        );
        state
            .by_output
            .entry(proof.output_hash().to_string())
            .or_default()
            .push(proof.combined_hash().to_string());
        state.sequence += 1;

        let tx_id = format!(
            "0x{}",
            digest_string(&format!("{}:{}", proof.combined_hash(), state.sequence))
        );
        debug!("Registered {} as {}", proof.combined_hash(), tx_id);
        Ok(tx_id)
    }

    async fn lookup(&self, combined_hash: &str) -> Result<Option<RegisteredProof>> {
        Ok(self.state.lock().await.proofs.get(combined_hash).cloned())
    }

    async fn lookup_by_output_hash(&self, output_hash: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .await
            .by_output
            .get(output_hash)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poa_core::assemble_proof;
    use std::sync::Arc;

    fn registration(creator: &str, timestamp: u64) -> Registration {
        Registration::new(
            assemble_proof("a red cube", &[1, 2, 3], creator, timestamp),
            "memory://artwork",
        )
    }

    #[tokio::test]
    async fn test_register_then_lookup() {
        let registry = MemoryRegistry::new();
        let reg = registration("0xABC", 1_700_000_000_000);

        let tx = registry.register(&reg).await.unwrap();
        assert!(tx.starts_with("0x"));
        assert_eq!(tx.len(), 66);

        let found = registry.lookup(reg.proof.combined_hash()).await.unwrap().unwrap();
        assert_eq!(found.creator_id, "0xABC");
        assert_eq!(found.timestamp, 1_700_000_000_000);
        assert_eq!(found.storage_link, "memory://artwork");

        assert!(registry.lookup("deadbeef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let registry = MemoryRegistry::new();
        let reg = registration("0xABC", 1);

        registry.register(&reg).await.unwrap();
        let err = registry.register(&reg).await.unwrap_err();
        assert!(matches!(err, PoaError::Conflict(ref h) if h == reg.proof.combined_hash()));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let registry = Arc::new(MemoryRegistry::new());
        let reg = registration("0xABC", 1_700_000_000_000);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = registry.clone();
                let reg = reg.clone();
                tokio::spawn(async move { registry.register(&reg).await })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(PoaError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!((successes, conflicts), (1, 1));
    }

    #[tokio::test]
    async fn test_output_index_keeps_every_fingerprint() {
        let registry = MemoryRegistry::new();
        let first = registration("0xABC", 1);
        let second = registration("0xDEF", 2);
        registry.register(&first).await.unwrap();
        registry.register(&second).await.unwrap();

        let hashes = registry
            .lookup_by_output_hash(first.proof.output_hash())
            .await
            .unwrap();
        assert_eq!(
            hashes,
            vec![
                first.proof.combined_hash().to_string(),
                second.proof.combined_hash().to_string()
            ]
        );
        assert!(registry.lookup_by_output_hash("none").await.unwrap().is_empty());
    }
}
