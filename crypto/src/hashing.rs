//! Hashing functions: SHA-256 for credentials, BLAKE3 for record digests

use sha2::{Digest, Sha256};

/// Length of a hex-encoded credential digest
pub const CREDENTIAL_DIGEST_LEN: usize = 64;

/// Compute SHA-256 of data, hex encoded
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Digest stored in place of a plaintext credential.
///
/// Unsalted: equal credentials produce equal digests.
pub fn hash_credential(credential: &str) -> String {
    sha256_hex(credential.as_bytes())
}

/// Check a plaintext credential against a stored digest
pub fn verify_credential(credential: &str, digest: &str) -> bool {
    let computed = hash_credential(credential);
    if computed.len() != digest.len() {
        return false;
    }
    computed
        .bytes()
        .zip(digest.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// BLAKE3 digest over several fields, hex encoded.
///
/// Each part is length-prefixed so field boundaries cannot shift.
pub fn record_digest(parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().to_hex().to_string()
}
