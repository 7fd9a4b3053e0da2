//! Combined fingerprint construction.
//!
//! Two constructions exist. `Concatenated` joins the four fields with no
//! separators and is what every proof registered so far was built with, so it
//! must stay byte-for-byte stable. `Framed` length-prefixes each field behind a
//! domain tag, which removes the ambiguity where digits at the end of a creator
//! id run into the timestamp.

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::hash::digest_string;

/// Domain tag hashed ahead of the framed fields
pub const FRAMED_DOMAIN_TAG: &[u8] = b"proof-of-art/v2";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintScheme {
    #[default]
    Concatenated,
    Framed,
}

impl FingerprintScheme {
    pub fn derive(
        self,
        prompt_hash: &str,
        output_hash: &str,
        creator_id: &str,
        timestamp: u64,
    ) -> String {
        match self {
            Self::Concatenated => combined_fingerprint(prompt_hash, output_hash, creator_id, timestamp),
            Self::Framed => combined_fingerprint_framed(prompt_hash, output_hash, creator_id, timestamp),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concatenated => "concatenated",
            Self::Framed => "framed",
        }
    }
}

impl fmt::Display for FingerprintScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerprintScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concatenated" => Ok(Self::Concatenated),
            "framed" => Ok(Self::Framed),
            other => Err(alloc::format!("unknown fingerprint scheme '{}'", other)),
        }
    }
}

/// `sha256(prompt_hash ‖ output_hash ‖ creator_id ‖ decimal(timestamp))`
pub fn combined_fingerprint(
    prompt_hash: &str,
    output_hash: &str,
    creator_id: &str,
    timestamp: u64,
) -> String {
    let timestamp = timestamp.to_string();
    let mut combined =
        String::with_capacity(prompt_hash.len() + output_hash.len() + creator_id.len() + timestamp.len());
    combined.push_str(prompt_hash);
    combined.push_str(output_hash);
    combined.push_str(creator_id);
    combined.push_str(&timestamp);
    digest_string(&combined)
}

/// Same fields as [`combined_fingerprint`], each hashed as
/// `u64 big-endian length ‖ utf8 bytes` after [`FRAMED_DOMAIN_TAG`].
pub fn combined_fingerprint_framed(
    prompt_hash: &str,
    output_hash: &str,
    creator_id: &str,
    timestamp: u64,
) -> String {
    let timestamp = timestamp.to_string();
    let mut hasher = Sha256::new();
    hasher.update(FRAMED_DOMAIN_TAG);
    for field in [prompt_hash, output_hash, creator_id, timestamp.as_str()] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}
