//! Content storage for artwork and proof metadata

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{PoaError, Result};

pub mod ipfs;
pub mod memory;

pub use ipfs::IpfsStorage;
pub use memory::MemoryStorage;

#[async_trait]
pub trait ContentStorage: Send + Sync {
    /// Store raw bytes under a display name, returning the locator
    async fn store(&self, bytes: Vec<u8>, name: &str) -> Result<String>;

    /// Store a JSON document (pretty-printed), returning the locator
    async fn store_json(&self, document: &serde_json::Value) -> Result<String> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| PoaError::Input(format!("metadata is not serializable: {}", e)))?;
        self.store(bytes, "metadata.json").await
    }

    /// Public URL for a locator returned by `store`
    fn gateway_url(&self, link: &str) -> String;
}

pub fn build(config: &StorageConfig) -> Result<Arc<dyn ContentStorage>> {
    Ok(match config.backend {
        StorageBackend::Ipfs => Arc::new(IpfsStorage::new(config)?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    })
}
