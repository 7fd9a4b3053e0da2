use poa_core::ProofRecord;
use serde::{Deserialize, Serialize};

use crate::resolver::VerifiedProof;

fn default_true() -> bool {
    true
}

fn default_kind() -> String {
    "image".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "userAddress")]
    pub creator_id: String,
    /// Only "image" is supported
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub register: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub proof: ProofRecord,
    pub storage_link: String,
    pub metadata_link: String,
    pub gateway_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction_id: Option<String>,
    /// Base64 artwork
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub proof: ProofRecord,
    pub storage_link: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub transaction_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub combined_hash: Option<String>,
    /// Base64 artwork bytes
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub combined_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub storage_link: Option<String>,
}

impl VerifyResponse {
    pub fn not_found() -> Self {
        Self::default()
    }
}

impl From<VerifiedProof> for VerifyResponse {
    fn from(proof: VerifiedProof) -> Self {
        Self {
            verified: true,
            combined_hash: Some(proof.combined_hash),
            creator_id: Some(proof.creator_id),
            timestamp: Some(proof.timestamp),
            storage_link: Some(proof.storage_link),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub scheme: String,
}
