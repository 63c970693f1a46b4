// crates/trawl-core/src/crypto.rs

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::TrawlError;

/// An ed25519 hotkey used to sign outbound peer calls.
pub struct Keypair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &hex::encode(self.public_key_bytes()))
            .finish()
    }
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Restore a keypair from a hex-encoded 32-byte secret (whitespace trimmed).
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, TrawlError> {
        let bytes = hex::decode(secret_hex.trim())?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TrawlError::Crypto("Secret key must be exactly 32 bytes".to_string()))?;
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The 32-byte secret, for writing key files.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message and return the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Verify an ed25519 signature.
///
/// Returns `Ok(false)` for a well-formed signature that does not match,
/// and an error only for malformed keys or signatures.
pub fn verify_signature(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, TrawlError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| TrawlError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| TrawlError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    Ok(verifying_key.verify(message, &signature).is_ok())
}

/// Compute the SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    hash_parts(&[data])
}

/// Compute SHA-256 over several fields, each length-prefixed so that
/// `("ab", "c")` and `("a", "bc")` hash differently.
pub fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"on_demand query";

        let signature = keypair.sign(message);
        let pubkey = keypair.public_key_bytes();

        assert!(verify_signature(&pubkey, message, &signature).unwrap());
        assert!(!verify_signature(&pubkey, b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_keypair_from_hex_roundtrips_public_key() {
        let secret = [7u8; 32];
        let a = Keypair::from_secret_bytes(&secret);
        let b = Keypair::from_secret_hex(&format!("{}\n", hex::encode(secret))).unwrap();
        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn test_keypair_from_hex_rejects_short_secret() {
        let err = Keypair::from_secret_hex("abcd").unwrap_err();
        assert!(matches!(err, TrawlError::Crypto(_)));
    }

    #[test]
    fn test_verify_rejects_bad_signature_length() {
        let keypair = Keypair::generate();
        let result = verify_signature(&keypair.public_key_bytes(), b"m", &[0u8; 10]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_parts_is_length_prefixed() {
        assert_ne!(hash_parts(&[b"ab", b"c"]), hash_parts(&[b"a", b"bc"]));
        assert_eq!(hash_bytes(b"x"), hash_parts(&[b"x"]));
    }
}
