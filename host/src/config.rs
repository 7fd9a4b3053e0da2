//! Service configuration
//!
//! Loaded from TOML, then overridden from the environment, then validated.
//! Every section has working defaults that need no network: the local
//! renderer, the memory store and the memory registry.

use std::net::SocketAddr;
use std::path::Path;

use poa_core::FingerprintScheme;
use serde::{Deserialize, Serialize};

use crate::error::{PoaError, Result};
use crate::generator::local::MAX_SCALE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoaConfig {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub storage: StorageConfig,
    pub registry: RegistryConfig,
    pub fingerprint: FingerprintConfig,
}

/// Room for a 1024x1024 RGBA PNG (4 MiB raw) once base64-encoded, plus JSON
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Allow any origin, for a browser UI served from elsewhere
    pub permissive_cors: bool,
    /// Request body cap; verify-by-file carries base64 artwork
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            permissive_cors: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    OpenAi,
    Stability,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub api_key: Option<String>,
    /// Overrides the backend's public endpoint
    pub api_url: Option<String>,
    pub model: String,
    pub size: String,
    /// Upscale factor for the local renderer's 64×64 canvas
    pub local_scale: u32,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Local,
            api_key: None,
            api_url: None,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            local_scale: 8,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Ipfs,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// IPFS HTTP API root, e.g. "https://ipfs.infura.io:5001/api/v0"
    pub api_url: String,
    /// "user:password" for basic auth
    pub auth: Option<String>,
    pub gateway: String,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            api_url: "https://ipfs.infura.io:5001/api/v0".to_string(),
            auth: None,
            gateway: "https://ipfs.io/ipfs/".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    Ethereum,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    pub rpc_url: String,
    pub chain_id: u64,
    /// Deployed ProofOfArt contract, 0x-prefixed
    pub contract_address: String,
    /// Required for registration; lookups work without it
    pub private_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::Memory,
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            contract_address: String::new(),
            private_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub scheme: FingerprintScheme,
}

impl PoaConfig {
    /// Load from a TOML file, apply environment overrides and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PoaError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(toml)
            .map_err(|e| PoaError::Configuration(format!("Invalid TOML: {}", e)))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = match self.generator.backend {
            GeneratorBackend::OpenAi => Some("OPENAI_API_KEY"),
            GeneratorBackend::Stability => Some("STABILITY_API_KEY"),
            GeneratorBackend::Local => None,
        };
        if let Some(key) = key_var.and_then(|k| lookup(k)) {
            self.generator.api_key = Some(key);
        }
        if let Some(url) = lookup("IPFS_API_URL") {
            self.storage.api_url = url;
        }
        if let Some(auth) = lookup("IPFS_AUTH") {
            self.storage.auth = Some(auth);
        }
        if let Some(gateway) = lookup("IPFS_GATEWAY") {
            self.storage.gateway = gateway;
        }
        if let Some(url) = lookup("RPC_URL") {
            self.registry.rpc_url = url;
        }
        if let Some(address) = lookup("CONTRACT_ADDRESS") {
            self.registry.contract_address = address;
        }
        if let Some(key) = lookup("REGISTRY_PRIVATE_KEY") {
            self.registry.private_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PoaError::Configuration(msg.to_string()));

        if self.server.max_body_bytes < 1024 {
            return fail("server.max_body_bytes must be at least 1024");
        }

        match self.generator.backend {
            GeneratorBackend::OpenAi | GeneratorBackend::Stability => {
                if self.generator.api_key.as_deref().unwrap_or_default().is_empty() {
                    return fail("generator.api_key is required for remote generators");
                }
            }
            GeneratorBackend::Local => {
                if self.generator.local_scale == 0 || self.generator.local_scale > MAX_SCALE {
                    return fail("generator.local_scale must be between 1 and 32");
                }
            }
        }
        if self.generator.timeout_secs == 0 {
            return fail("generator.timeout_secs must be positive");
        }

        if self.storage.backend == StorageBackend::Ipfs {
            if !is_http_url(&self.storage.api_url) {
                return fail("storage.api_url must start with http:// or https://");
            }
            if let Some(auth) = &self.storage.auth {
                if !auth.contains(':') {
                    return fail("storage.auth must be 'user:password'");
                }
            }
        }
        if self.storage.timeout_secs == 0 {
            return fail("storage.timeout_secs must be positive");
        }

        if self.registry.backend == RegistryBackend::Ethereum {
            if !is_http_url(&self.registry.rpc_url) {
                return fail("registry.rpc_url must start with http:// or https://");
            }
            let address = &self.registry.contract_address;
            if !address.starts_with("0x") || address.len() != 42 {
                return fail("registry.contract_address must be a 0x-prefixed 20-byte address");
            }
        }
        if self.registry.timeout_secs == 0 {
            return fail("registry.timeout_secs must be positive");
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
