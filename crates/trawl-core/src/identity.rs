// crates/trawl-core/src/identity.rs

use serde::{Deserialize, Serialize};

use crate::crypto::Keypair;

/// Role a node plays in the network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Holds data and answers content queries.
    Miner,
    /// Coordinates queries and scores miners. Never a query target.
    Validator,
}

/// Identity of this coordinator on the network.
///
/// The hotkey signs every outbound peer call so miners can attribute
/// and rate-limit requests. The secret half never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// This coordinator's uid in the metagraph.
    pub uid: u16,
    /// Hotkey public key (ed25519).
    pub hotkey: [u8; 32],
    /// DID derived from the hotkey (e.g., "did:trawl:0xabc...").
    pub did: String,
}

impl NodeIdentity {
    /// Build an identity from a hotkey public key.
    pub fn from_hotkey(uid: u16, hotkey: [u8; 32]) -> Self {
        Self {
            uid,
            hotkey,
            did: format!("did:trawl:0x{}", hex::encode(hotkey)),
        }
    }

    /// Build an identity from a loaded keypair.
    pub fn from_keypair(uid: u16, keypair: &Keypair) -> Self {
        Self::from_hotkey(uid, keypair.public_key_bytes())
    }

    /// Placeholder used when no key material is configured.
    pub fn placeholder(uid: u16) -> Self {
        Self {
            uid,
            hotkey: [0u8; 32],
            did: "did:trawl:local".to_string(),
        }
    }

    /// True when this identity was not derived from real key material.
    pub fn is_placeholder(&self) -> bool {
        self.hotkey == [0u8; 32]
    }
}
