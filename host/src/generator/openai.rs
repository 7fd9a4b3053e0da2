use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{api_key, http_client, Generator};
use crate::config::GeneratorConfig;
use crate::error::{PoaError, Result, Service};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Images API (`/images/generations`); the returned URL is downloaded in full
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    size: String,
}

impl OpenAiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: api_key(config)?,
            model: config.model.clone(),
            size: config.size.clone(),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        debug!("Requesting {} image ({})", self.model, self.size);

        let response = self
            .client
            .post(format!("{}/images/generations", self.api_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&ImageRequest {
                model: &self.model,
                prompt,
                n: 1,
                size: &self.size,
                response_format: "url",
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;

        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;

        let url = body
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| PoaError::upstream(Service::Generator, "no image URL returned"))?;

        self.download(&url).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
