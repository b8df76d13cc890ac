//! Opaque API credential issuance and digest computation.
//!
//! A credential is the token a remote sensor presents with every
//! ingestion request. Only its SHA-256 digest is ever stored;
//! verification is a digest-indexed lookup, so no plaintext comparison
//! happens anywhere.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random opaque API credential
/// (32 bytes → base64url-encoded, no padding).
pub fn issue_api_key() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw API credential, hex-encoded.
///
/// This is the value stored in the database as `tenant.api_key_hash`.
pub fn hash_api_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
