//! Proof creation pipeline
//!
//! generate → assemble proof → store artwork → store metadata → register.
//! Registration runs last and is the commit point: if storage fails nothing is
//! registered, and if registration fails only unreferenced content-addressed
//! blobs remain. The timestamp is sampled once per request.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use poa_core::{assemble_proof_with, FingerprintScheme, ProofRecord};
use serde_json::json;
use tracing::{debug, info};

use crate::config::PoaConfig;
use crate::error::{PoaError, Result, Service};
use crate::generator::{self, Generator};
use crate::registry::{self, Registration, Registry};
use crate::resolver::Resolver;
use crate::storage::{self, ContentStorage};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub creator_id: String,
    pub register: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub proof: ProofRecord,
    pub output: Vec<u8>,
    pub storage_link: String,
    pub metadata_link: String,
    pub gateway_url: String,
    pub transaction_id: Option<String>,
}

/// Document pinned next to the artwork
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofMetadata {
    pub prompt: String,
    pub prompt_hash: String,
    pub output_hash: String,
    pub combined_hash: String,
    pub creator: String,
    pub timestamp: u64,
    pub ipfs_link: String,
    pub kind: String,
    pub scheme: FingerprintScheme,
}

impl ProofMetadata {
    pub fn new(prompt: &str, proof: &ProofRecord, storage_link: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            prompt_hash: proof.prompt_hash().to_string(),
            output_hash: proof.output_hash().to_string(),
            combined_hash: proof.combined_hash().to_string(),
            creator: proof.creator_id().to_string(),
            timestamp: proof.timestamp(),
            ipfs_link: storage_link.to_string(),
            kind: "image".to_string(),
            scheme: proof.scheme(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "prompt": self.prompt,
            "promptHash": self.prompt_hash,
            "outputHash": self.output_hash,
            "combinedHash": self.combined_hash,
            "creator": self.creator,
            "timestamp": self.timestamp,
            "ipfsLink": self.ipfs_link,
            "type": self.kind,
            "scheme": self.scheme.as_str(),
        })
    }
}

pub fn validate_generation(request: &GenerationRequest) -> Result<()> {
    if request.prompt.trim().is_empty() {
        return Err(PoaError::Input("prompt is required".to_string()));
    }
    if request.creator_id.trim().is_empty() {
        return Err(PoaError::Input("creator id is required".to_string()));
    }
    Ok(())
}

pub fn now_millis() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| PoaError::Configuration(format!("system clock before epoch: {}", e)))
}

pub struct ProofService {
    generator: Arc<dyn Generator>,
    storage: Arc<dyn ContentStorage>,
    registry: Arc<dyn Registry>,
    scheme: FingerprintScheme,
}

impl ProofService {
    pub fn new(
        generator: Arc<dyn Generator>,
        storage: Arc<dyn ContentStorage>,
        registry: Arc<dyn Registry>,
        scheme: FingerprintScheme,
    ) -> Self {
        Self {
            generator,
            storage,
            registry,
            scheme,
        }
    }

    pub fn from_config(config: &PoaConfig) -> Result<Self> {
        let generator = generator::build(&config.generator)?;
        let storage = storage::build(&config.storage)?;
        let registry = registry::build(&config.registry)?;

        info!(
            "Proof service: generator={}, storage={:?}, registry={:?}, scheme={}",
            generator.name(),
            config.storage.backend,
            config.registry.backend,
            config.fingerprint.scheme
        );

        Ok(Self::new(generator, storage, registry, config.fingerprint.scheme))
    }

    pub fn scheme(&self) -> FingerprintScheme {
        self.scheme
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.registry.clone())
    }

    pub async fn create_proof(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        self.create_proof_at(request, now_millis()?).await
    }

    /// Run the pipeline with a caller-supplied timestamp (milliseconds)
    pub async fn create_proof_at(
        &self,
        request: &GenerationRequest,
        timestamp: u64,
    ) -> Result<GenerationOutcome> {
        validate_generation(request)?;

        let output = self.generator.generate(&request.prompt).await?;
        if output.is_empty() {
            return Err(PoaError::upstream(Service::Generator, "generator returned no bytes"));
        }

        let proof = assemble_proof_with(
            self.scheme,
            &request.prompt,
            &output,
            &request.creator_id,
            timestamp,
        );
        debug!("Assembled proof {}", proof.combined_hash());

        let storage_link = self
            .storage
            .store(output.clone(), &format!("output-{}.png", timestamp))
            .await?;
        let metadata = ProofMetadata::new(&request.prompt, &proof, &storage_link);
        let metadata_link = self.storage.store_json(&metadata.to_json()).await?;

        let transaction_id = if request.register {
            let registration = Registration::new(proof.clone(), storage_link.clone());
            Some(self.registry.register(&registration).await?)
        } else {
            None
        };

        info!(
            "Created proof {} for {} (registered: {})",
            proof.combined_hash(),
            proof.creator_id(),
            transaction_id.is_some()
        );

        Ok(GenerationOutcome {
            gateway_url: self.storage.gateway_url(&storage_link),
            proof,
            output,
            storage_link,
            metadata_link,
            transaction_id,
        })
    }

    /// Register a proof produced earlier, e.g. by `create_proof` with
    /// `register: false`. The record is re-derived before it is accepted.
    pub async fn register(&self, proof: ProofRecord, storage_link: String) -> Result<String> {
        if !proof.is_consistent() {
            return Err(PoaError::Input(
                "combined hash does not match the proof fields".to_string(),
            ));
        }
        if proof.creator_id().trim().is_empty() {
            return Err(PoaError::Input("creator id is required".to_string()));
        }
        if storage_link.trim().is_empty() {
            return Err(PoaError::Input("storage link is required".to_string()));
        }

        self.registry
            .register(&Registration::new(proof, storage_link))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::LocalGenerator;
    use crate::registry::MemoryRegistry;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use poa_core::{assemble_proof, digest_bytes};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator(Vec<u8>);

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingStorage {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ContentStorage for FailingStorage {
        async fn store(&self, _bytes: Vec<u8>, _name: &str) -> Result<String> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PoaError::upstream(Service::Storage, "pinning service down"))
        }

        fn gateway_url(&self, link: &str) -> String {
            link.to_string()
        }
    }

    fn request(register: bool) -> GenerationRequest {
        GenerationRequest {
            prompt: "a red cube".to_string(),
            creator_id: "0xABC".to_string(),
            register,
        }
    }

    fn service(
        generator: Arc<dyn Generator>,
        storage: Arc<dyn ContentStorage>,
        registry: Arc<MemoryRegistry>,
    ) -> ProofService {
        ProofService::new(generator, storage, registry, FingerprintScheme::Concatenated)
    }

    #[tokio::test]
    async fn test_create_proof_matches_scenario() {
        let storage = Arc::new(MemoryStorage::new());
        let registry = Arc::new(MemoryRegistry::new());
        let service = service(
            Arc::new(FixedGenerator(vec![1, 2, 3])),
            storage.clone(),
            registry.clone(),
        );

        let outcome = service
            .create_proof_at(&request(true), 1_700_000_000_000)
            .await
            .unwrap();

        assert_eq!(outcome.proof, assemble_proof("a red cube", &[1, 2, 3], "0xABC", 1_700_000_000_000));
        assert_eq!(
            outcome.proof.combined_hash(),
            "f6c8d975ffa337c6b38da1018489c22fd6357f13f412f926eddcb91ee2757a8b"
        );
        assert_eq!(outcome.storage_link, format!("memory://{}", digest_bytes(&[1, 2, 3])));
        assert!(outcome.transaction_id.is_some());

        let metadata = storage.get(&outcome.metadata_link).await.unwrap();
        let metadata: serde_json::Value = serde_json::from_slice(&metadata).unwrap();
        assert_eq!(metadata["timestamp"], 1_700_000_000_000u64);
        assert_eq!(metadata["combinedHash"], outcome.proof.combined_hash());
        assert_eq!(metadata["ipfsLink"], outcome.storage_link);
        assert_eq!(metadata["type"], "image");

        let verified = service
            .resolver()
            .verify_by_hash(outcome.proof.combined_hash())
            .await
            .unwrap();
        assert_eq!(verified.creator_id, "0xABC");
        assert_eq!(verified.timestamp, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_unregistered_generation_then_register() {
        let registry = Arc::new(MemoryRegistry::new());
        let service = service(
            Arc::new(LocalGenerator::new(1)),
            Arc::new(MemoryStorage::new()),
            registry.clone(),
        );

        let outcome = service.create_proof(&request(false)).await.unwrap();
        assert!(outcome.transaction_id.is_none());
        assert_eq!(registry.len().await, 0);

        service
            .register(outcome.proof.clone(), outcome.storage_link.clone())
            .await
            .unwrap();
        let err = service
            .register(outcome.proof, outcome.storage_link)
            .await
            .unwrap_err();
        assert!(matches!(err, PoaError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_registers_nothing() {
        let registry = Arc::new(MemoryRegistry::new());
        let storage = Arc::new(FailingStorage {
            attempts: AtomicUsize::new(0),
        });
        let service = service(Arc::new(FixedGenerator(vec![7])), storage.clone(), registry.clone());

        let err = service.create_proof(&request(true)).await.unwrap_err();
        assert!(err.is_retriable());
        assert_eq!(storage.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let service = service(
            Arc::new(FixedGenerator(vec![1])),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryRegistry::new()),
        );

        let mut bad = request(true);
        bad.prompt = "  ".to_string();
        assert!(matches!(service.create_proof(&bad).await, Err(PoaError::Input(_))));

        let mut bad = request(true);
        bad.creator_id.clear();
        assert!(matches!(service.create_proof(&bad).await, Err(PoaError::Input(_))));
    }

    #[tokio::test]
    async fn test_empty_output_is_upstream_error() {
        let service = service(
            Arc::new(FixedGenerator(Vec::new())),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryRegistry::new()),
        );
        let err = service.create_proof(&request(true)).await.unwrap_err();
        assert!(matches!(err, PoaError::Upstream { service: Service::Generator, .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_tampered_record() {
        let service = service(
            Arc::new(FixedGenerator(vec![1])),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryRegistry::new()),
        );
        let proof = assemble_proof("a red cube", &[1, 2, 3], "0xABC", 1);
        let mut value = serde_json::to_value(&proof).unwrap();
        value["timestamp"] = 2.into();
        let tampered: ProofRecord = serde_json::from_value(value).unwrap();

        let err = service.register(tampered, "memory://x".to_string()).await.unwrap_err();
        assert!(matches!(err, PoaError::Input(_)));
    }
}
