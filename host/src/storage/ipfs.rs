//! IPFS HTTP API client (`/api/v0/add`)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::ContentStorage;
use crate::config::StorageConfig;
use crate::error::{PoaError, Result, Service};

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

pub struct IpfsStorage {
    client: reqwest::Client,
    add_url: String,
    auth: Option<(String, String)>,
    gateway: String,
}

impl IpfsStorage {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PoaError::Configuration(format!("IPFS client: {}", e)))?;

        let auth = config.auth.as_deref().and_then(|auth| {
            auth.split_once(':')
                .map(|(user, password)| (user.to_string(), password.to_string()))
        });

        Ok(Self {
            client,
            add_url: format!("{}/add?pin=true", config.api_url.trim_end_matches('/')),
            auth,
            gateway: config.gateway.clone(),
        })
    }

    pub fn add_url(&self) -> &str {
        &self.add_url
    }
}

/// Join a gateway prefix and a CID with exactly one slash between them
pub fn join_gateway(gateway: &str, cid: &str) -> String {
    format!("{}/{}", gateway.trim_end_matches('/'), cid)
}

#[async_trait]
impl ContentStorage for IpfsStorage {
    async fn store(&self, bytes: Vec<u8>, name: &str) -> Result<String> {
        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(name.to_string()));

        let mut request = self.client.post(&self.add_url).multipart(form);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PoaError::upstream(Service::Storage, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PoaError::upstream(
                Service::Storage,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| PoaError::upstream(Service::Storage, e))?;

        debug!("Pinned {} ({} bytes) as {}", name, size, added.hash);
        Ok(added.hash)
    }

    fn gateway_url(&self, link: &str) -> String {
        join_gateway(&self.gateway, link)
    }
}
