use alloc::string::String;

use sha2::{Digest, Sha256};

/// Length of every hex digest produced by this crate (SHA-256, 32 bytes).
pub const DIGEST_HEX_LEN: usize = 64;

/// Raw SHA-256 of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of a byte sequence
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Lowercase hex SHA-256 of the UTF-8 encoding of `text`
pub fn digest_string(text: &str) -> String {
    digest_bytes(text.as_bytes())
}

/// True if `value` looks like a digest produced by [`digest_bytes`]
pub fn is_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
