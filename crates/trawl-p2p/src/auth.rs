// crates/trawl-p2p/src/auth.rs
//
// Request signing for coordinator -> miner calls.
//
// Every outbound query carries the coordinator's hotkey, a millisecond
// nonce, and an ed25519 signature over SHA-256(nonce || hotkey || body).
// Miners use `verify_request` to attribute the call and reject replays
// outside the allowed clock skew.

use trawl_core::crypto::{hash_parts, verify_signature, Keypair};
use trawl_core::error::TrawlError;

/// Hex-encoded hotkey of the caller.
pub const HOTKEY_HEADER: &str = "x-trawl-hotkey";
/// Caller clock in Unix milliseconds.
pub const NONCE_HEADER: &str = "x-trawl-nonce";
/// Hex-encoded ed25519 signature.
pub const SIGNATURE_HEADER: &str = "x-trawl-signature";

/// Header values to attach to one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub hotkey: String,
    pub nonce: String,
    pub signature: String,
}

/// The digest that gets signed.
pub fn signing_digest(nonce: i64, hotkey: &[u8; 32], body: &[u8]) -> [u8; 32] {
    hash_parts(&[&nonce.to_le_bytes(), hotkey, body])
}

/// Sign a request body.
pub fn sign_request(keypair: &Keypair, nonce: i64, body: &[u8]) -> SignedHeaders {
    let hotkey = keypair.public_key_bytes();
    let signature = keypair.sign(&signing_digest(nonce, &hotkey, body));
    SignedHeaders {
        hotkey: hex::encode(hotkey),
        nonce: nonce.to_string(),
        signature: hex::encode(signature),
    }
}

/// Check a signed request.
///
/// Returns the caller's hotkey when the signature is valid and the nonce is
/// within `max_skew_ms` of `now_ms`.
pub fn verify_request(
    headers: &SignedHeaders,
    body: &[u8],
    now_ms: i64,
    max_skew_ms: i64,
) -> Result<[u8; 32], TrawlError> {
    let hotkey: [u8; 32] = hex::decode(&headers.hotkey)?
        .try_into()
        .map_err(|_| TrawlError::Crypto("Hotkey must be exactly 32 bytes".to_string()))?;

    let nonce: i64 = headers
        .nonce
        .parse()
        .map_err(|_| TrawlError::Crypto(format!("Invalid nonce: {}", headers.nonce)))?;
    if now_ms.abs_diff(nonce) > max_skew_ms.max(0) as u64 {
        return Err(TrawlError::Crypto(format!(
            "Nonce {} outside allowed skew of {}ms",
            nonce, max_skew_ms
        )));
    }

    let signature = hex::decode(&headers.signature)?;
    if !verify_signature(&hotkey, &signing_digest(nonce, &hotkey, body), &signature)? {
        return Err(TrawlError::Crypto("Signature mismatch".to_string()));
    }

    Ok(hotkey)
}
