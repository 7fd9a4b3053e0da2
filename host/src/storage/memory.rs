use std::collections::HashMap;

use async_trait::async_trait;
use poa_core::digest_bytes;
use tokio::sync::Mutex;

use super::ContentStorage;
use crate::error::Result;

pub const MEMORY_SCHEME: &str = "memory://";

/// Content-addressed in-process store; links are `memory://<sha256>`
#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, link: &str) -> Option<Vec<u8>> {
        let key = link.strip_prefix(MEMORY_SCHEME)?;
        self.blobs.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }
}

#[async_trait]
impl ContentStorage for MemoryStorage {
    async fn store(&self, bytes: Vec<u8>, _name: &str) -> Result<String> {
        let key = digest_bytes(&bytes);
        self.blobs.lock().await.insert(key.clone(), bytes);
        Ok(format!("{}{}", MEMORY_SCHEME, key))
    }

    fn gateway_url(&self, link: &str) -> String {
        link.to_string()
    }
}
