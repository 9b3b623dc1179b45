use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canon::canonical_json_of;

/// Compute SHA-256 hash of bytes, returning lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON form of `value`.
pub fn canonical_digest<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(sha256_hex(&canonical_json_of(value)?))
}
