// crates/trawl-core/src/metagraph.rs

use serde::{Deserialize, Serialize};

use crate::identity::NodeRole;

/// A snapshot of network membership: every registered node with its
/// role, trust weight, and serving address.
///
/// Produced outside this service (by whatever tracks stake and scores)
/// and treated as immutable for the lifetime of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metagraph {
    /// Block height the snapshot was taken at.
    #[serde(default)]
    pub block: u64,
    /// All registered nodes.
    pub nodes: Vec<NodeInfo>,
}

/// Information about a single node in the metagraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    /// Network-assigned unique ID.
    pub uid: u16,
    /// Hotkey (operational identity), hex encoded on the wire.
    #[serde(with = "hex_key")]
    pub hotkey: [u8; 32],
    /// Miner or validator.
    pub role: NodeRole,
    /// Trust weight. Larger means more trusted.
    pub trust: f64,
    /// Base URL of the node's query endpoint (e.g., "http://10.0.0.7:8091").
    pub axon_addr: String,
    /// Whether the node is currently registered and serving.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Metagraph {
    /// Create a snapshot from a list of nodes.
    pub fn new(block: u64, nodes: Vec<NodeInfo>) -> Self {
        Self { block, nodes }
    }

    /// Look up a node by uid.
    pub fn node(&self, uid: u16) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.uid == uid)
    }
}

mod hex_key {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        let bytes = hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("hotkey must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_json() {
        let json = serde_json::json!({
            "block": 42,
            "nodes": [{
                "uid": 5,
                "hotkey": format!("0x{}", "11".repeat(32)),
                "role": "miner",
                "trust": 0.25,
                "axon_addr": "http://127.0.0.1:8091"
            }]
        });

        let graph: Metagraph = serde_json::from_value(json).unwrap();
        assert_eq!(graph.block, 42);
        let node = graph.node(5).unwrap();
        assert_eq!(node.hotkey, [0x11; 32]);
        assert_eq!(node.role, NodeRole::Miner);
        assert!(node.active, "active defaults to true");
        assert!(graph.node(6).is_none());
    }

    #[test]
    fn rejects_short_hotkey() {
        let json = serde_json::json!({
            "nodes": [{
                "uid": 1, "hotkey": "abcd", "role": "miner",
                "trust": 1.0, "axon_addr": "http://x"
            }]
        });
        assert!(serde_json::from_value::<Metagraph>(json).is_err());
    }
}
