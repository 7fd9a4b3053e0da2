//! ProofOfArt contract adapter
//!
//! Reads go through a plain HTTP provider; writes need `private_key` and go
//! through a wallet-filled provider. Providers are built per call and not
//! cached.

use std::future::IntoFuture;
use std::str::FromStr;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{RegisteredProof, Registration, Registry};
use crate::config::RegistryConfig;
use crate::error::{PoaError, Result, Service};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    contract ProofOfArt {
        error ProofAlreadyRegistered(string combinedHash);

        function registerProof(
            string calldata promptHash,
            string calldata outputHash,
            string calldata combinedHash,
            string calldata creatorId,
            uint256 timestamp,
            string calldata storageLink
        ) external;

        function verifyProof(string calldata combinedHash)
            external
            view
            returns (bool exists, string memory creatorId, uint256 timestamp, string memory storageLink);

        function combinedHashesByOutput(string calldata outputHash)
            external
            view
            returns (string[] memory combinedHashes);
    }
}

pub struct EthereumRegistry {
    contract_address: Address,
    rpc_url: String,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
    timeout: Duration,
}

impl EthereumRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let contract_address = Address::from_str(&config.contract_address).map_err(|e| {
            PoaError::Configuration(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let signer = config
            .private_key
            .as_deref()
            .map(|key| {
                key.parse::<PrivateKeySigner>()
                    .map_err(|e| PoaError::Configuration(format!("Invalid private key: {}", e)))
            })
            .transpose()?;

        match &signer {
            Some(signer) => info!(
                "Ethereum registry on chain {} at {}, signing as {}",
                config.chain_id,
                contract_address,
                signer.address()
            ),
            None => warn!(
                "Ethereum registry on chain {} at {} is read-only: no private key",
                config.chain_id, contract_address
            ),
        }

        Ok(Self {
            contract_address,
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            signer,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn has_wallet(&self) -> bool {
        self.signer.is_some()
    }

    fn create_provider(&self) -> Result<impl Provider> {
        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| PoaError::Configuration(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().connect_http(rpc_url))
    }

    fn create_provider_with_signer(&self) -> Result<impl Provider> {
        let signer = self.signer.clone().ok_or_else(|| {
            PoaError::Configuration("Registration requires registry.private_key".to_string())
        })?;
        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| PoaError::Configuration(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url))
    }

    /// `call()` builders are `IntoFuture`, not `Future`
    async fn bounded<T>(&self, fut: impl IntoFuture<Output = T>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut.into_future()).await.map_err(|_| {
            PoaError::upstream(
                Service::Registry,
                format!("no response after {}s", self.timeout.as_secs()),
            )
        })
    }
}

fn classify_send_error(error: alloy::contract::Error, combined_hash: &str) -> PoaError {
    if error
        .as_decoded_error::<ProofOfArt::ProofAlreadyRegistered>()
        .is_some()
    {
        return PoaError::Conflict(combined_hash.to_string());
    }
    PoaError::upstream(Service::Registry, error)
}

#[async_trait]
impl Registry for EthereumRegistry {
    async fn register(&self, registration: &Registration) -> Result<String> {
        let proof = &registration.proof;
        debug!("Registering {} on chain {}", proof.combined_hash(), self.chain_id);

        let provider = self.create_provider_with_signer()?;
        let contract = ProofOfArt::new(self.contract_address, &provider);

        let pending_tx = self
            .bounded(
                contract
                    .registerProof(
                        proof.prompt_hash().to_string(),
                        proof.output_hash().to_string(),
                        proof.combined_hash().to_string(),
                        proof.creator_id().to_string(),
                        U256::from(proof.timestamp()),
                        registration.storage_link.clone(),
                    )
                    .send(),
            )
            .await?
            .map_err(|e| classify_send_error(e, proof.combined_hash()))?;

        let receipt = self
            .bounded(pending_tx.get_receipt())
            .await?
            .map_err(|e| PoaError::upstream(Service::Registry, e))?;

        let tx_hash = format!("0x{:x}", receipt.transaction_hash);
        if !receipt.status() {
            return Err(PoaError::upstream(
                Service::Registry,
                format!("transaction {} reverted", tx_hash),
            ));
        }

        debug!("Registered {} in {}", proof.combined_hash(), tx_hash);
        Ok(tx_hash)
    }

    async fn lookup(&self, combined_hash: &str) -> Result<Option<RegisteredProof>> {
        let provider = self.create_provider()?;
        let contract = ProofOfArt::new(self.contract_address, &provider);

        let result = self
            .bounded(contract.verifyProof(combined_hash.to_string()).call())
            .await?
            .map_err(|e| PoaError::upstream(Service::Registry, e))?;

        if !result.exists {
            return Ok(None);
        }

        let timestamp = u64::try_from(result.timestamp).map_err(|_| {
            PoaError::upstream(
                Service::Registry,
                format!("timestamp {} out of range", result.timestamp),
            )
        })?;

        Ok(Some(RegisteredProof {
            creator_id: result.creatorId,
            timestamp,
            storage_link: result.storageLink,
        }))
    }

    async fn lookup_by_output_hash(&self, output_hash: &str) -> Result<Vec<String>> {
        let provider = self.create_provider()?;
        let contract = ProofOfArt::new(self.contract_address, &provider);

        self.bounded(contract.combinedHashesByOutput(output_hash.to_string()).call())
            .await?
            .map_err(|e| PoaError::upstream(Service::Registry, e))
    }
}
