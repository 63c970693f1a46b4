// crates/trawl-rpc/src/merge.rs
//
// ResultMerger: flatten miner payloads into one deduplicated, truncated list.

use std::collections::HashSet;

use trawl_core::query::QueryResultItem;

/// Merged view over every payload of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedResult {
    /// Unique items in first-seen order, at most `limit` long.
    pub data: Vec<QueryResultItem>,
    /// Number of payloads merged (one per answering miner).
    pub total_responses: usize,
    /// Distinct items seen before truncation.
    pub unique_items: usize,
}

/// Merge `payloads` in the order given.
///
/// The first occurrence of each [`ItemKey`](trawl_core::query::ItemKey) wins, so
/// earlier payloads take precedence over later ones.
pub fn merge(payloads: Vec<Vec<QueryResultItem>>, limit: usize) -> MergedResult {
    let total_responses = payloads.len();
    let mut seen = HashSet::new();
    let mut data = Vec::new();

    for item in payloads.into_iter().flatten() {
        if seen.insert(item.key()) {
            data.push(item);
        }
    }

    let unique_items = data.len();
    data.truncate(limit);

    MergedResult {
        data,
        total_responses,
        unique_items,
    }
}
