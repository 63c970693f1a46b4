// crates/trawl-core/src/query.rs
//
// Wire types exchanged with miners for on-demand queries, and the
// structural identity used to deduplicate what they return.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::hash_parts;
use crate::error::TrawlError;
use crate::source::DataSource;

/// A validated on-demand query, as sent to each miner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnDemandRequest {
    pub source: DataSource,
    #[serde(default)]
    pub usernames: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u32,
}

impl OnDemandRequest {
    /// Check the request invariants: `1 <= limit <= max_limit` and an
    /// ordered date range when both ends are given.
    pub fn validate(&self, max_limit: u32) -> Result<(), TrawlError> {
        if self.limit == 0 || self.limit > max_limit {
            return Err(TrawlError::InvalidArgument(format!(
                "limit must be between 1 and {}, got {}",
                max_limit, self.limit
            )));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(TrawlError::InvalidArgument(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A miner's reply to an [`OnDemandRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnDemandResponse {
    #[serde(default)]
    pub data: Vec<QueryResultItem>,
}

/// One record returned by a miner. Opaque to the coordinator apart
/// from its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResultItem(pub serde_json::Value);

/// Structural identity of a [`QueryResultItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(pub [u8; 32]);

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl QueryResultItem {
    /// Derive the item's identity.
    ///
    /// Items that carry a `uri` are identified by `(source, uri)` alone, so two
    /// miners reporting the same post with different scrape metadata collapse
    /// into one. Anything else is identified by its canonical JSON encoding,
    /// which ignores key order and whitespace.
    pub fn key(&self) -> ItemKey {
        if let Some(uri) = self.0.get("uri").and_then(|v| v.as_str()) {
            let source = self
                .0
                .get("source")
                .map(canonical_json)
                .unwrap_or_default();
            return ItemKey(hash_parts(&[b"uri", source.as_bytes(), uri.as_bytes()]));
        }
        ItemKey(hash_parts(&[b"json", canonical_json(&self.0).as_bytes()]))
    }
}

/// Deterministic compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
