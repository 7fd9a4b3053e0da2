//! Artwork generators
//!
//! A generator turns a prompt into image bytes. Remote backends can take tens
//! of seconds; callers await the full body before hashing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GeneratorBackend, GeneratorConfig};
use crate::error::{PoaError, Result};

pub mod local;
pub mod openai;
pub mod stability;

pub use local::LocalGenerator;
pub use openai::OpenAiGenerator;
pub use stability::StabilityGenerator;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;

    fn name(&self) -> &'static str;
}

pub fn build(config: &GeneratorConfig) -> Result<Arc<dyn Generator>> {
    Ok(match config.backend {
        GeneratorBackend::OpenAi => Arc::new(OpenAiGenerator::new(config)?),
        GeneratorBackend::Stability => Arc::new(StabilityGenerator::new(config)?),
        GeneratorBackend::Local => Arc::new(LocalGenerator::new(config.local_scale)),
    })
}

fn http_client(config: &GeneratorConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PoaError::Configuration(format!("generator client: {}", e)))
}

fn api_key(config: &GeneratorConfig) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| PoaError::Configuration("generator.api_key is not set".to_string()))
}
