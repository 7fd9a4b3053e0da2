use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::fingerprint::FingerprintScheme;
use crate::hash::{digest_bytes, digest_string, is_digest};

/// Fingerprint record for one generation event.
///
/// Fields are only readable; a record is fixed once assembled. Records that
/// come back over the wire should be checked with [`ProofRecord::is_consistent`]
/// before being trusted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    prompt_hash: String,
    output_hash: String,
    combined_hash: String,
    creator_id: String,
    timestamp: u64,
    #[serde(default)]
    scheme: FingerprintScheme,
}

impl ProofRecord {
    pub fn prompt_hash(&self) -> &str {
        &self.prompt_hash
    }

    pub fn output_hash(&self) -> &str {
        &self.output_hash
    }

    pub fn combined_hash(&self) -> &str {
        &self.combined_hash
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    /// Milliseconds since epoch, captured when the proof was assembled
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn scheme(&self) -> FingerprintScheme {
        self.scheme
    }

    /// Recompute the combined hash from the other fields and compare.
    pub fn is_consistent(&self) -> bool {
        is_digest(&self.prompt_hash)
            && is_digest(&self.output_hash)
            && self.scheme.derive(
                &self.prompt_hash,
                &self.output_hash,
                &self.creator_id,
                self.timestamp,
            ) == self.combined_hash
    }
}

/// Assemble a proof with the concatenated fingerprint scheme.
pub fn assemble_proof(prompt: &str, output: &[u8], creator_id: &str, timestamp: u64) -> ProofRecord {
    assemble_proof_with(FingerprintScheme::Concatenated, prompt, output, creator_id, timestamp)
}

/// Assemble a proof. The output is hashed to completion before the combined
/// fingerprint is derived, and `timestamp` is used as given.
pub fn assemble_proof_with(
    scheme: FingerprintScheme,
    prompt: &str,
    output: &[u8],
    creator_id: &str,
    timestamp: u64,
) -> ProofRecord {
    let prompt_hash = digest_string(prompt);
    let output_hash = digest_bytes(output);
    let combined_hash = scheme.derive(&prompt_hash, &output_hash, creator_id, timestamp);

    ProofRecord {
        prompt_hash,
        output_hash,
        combined_hash,
        creator_id: creator_id.into(),
        timestamp,
        scheme,
    }
}
