use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{api_key, http_client, Generator};
use crate::config::GeneratorConfig;
use crate::error::{PoaError, Result, Service};

const DEFAULT_API_URL: &str =
    "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image";

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: u32,
    height: u32,
    width: u32,
    steps: u32,
    samples: u32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: Option<String>,
}

/// Stability AI SDXL text-to-image; the image arrives base64-encoded inline
pub struct StabilityGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl StabilityGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: api_key(config)?,
        })
    }
}

fn decode_first_artifact(body: TextToImageResponse) -> Result<Vec<u8>> {
    let encoded = body
        .artifacts
        .into_iter()
        .find_map(|a| a.base64)
        .ok_or_else(|| PoaError::upstream(Service::Generator, "no image returned"))?;

    STANDARD
        .decode(encoded)
        .map_err(|e| PoaError::upstream(Service::Generator, format!("bad base64 artifact: {}", e)))
}

#[async_trait]
impl Generator for StabilityGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        debug!("Requesting SDXL image");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TextToImageRequest {
                text_prompts: [TextPrompt { text: prompt }],
                cfg_scale: 7,
                height: 1024,
                width: 1024,
                steps: 30,
                samples: 1,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;

        let body: TextToImageResponse = response
            .json()
            .await
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;

        decode_first_artifact(body)
    }

    fn name(&self) -> &'static str {
        "stability"
    }
}
