// crates/trawl-core/src/stats.rs

use serde::{Deserialize, Serialize};

/// Total content indexed under one label for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSize {
    /// The label (subreddit, hashtag, channel...). `None` for unlabeled content.
    pub label_value: Option<String>,
    /// Raw bytes across all miners.
    pub content_size_bytes: u64,
    /// Bytes after credibility adjustment.
    pub adj_content_size_bytes: u64,
}

/// Total content indexed in one time bucket for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSize {
    /// Hour bucket id (see [`crate::source::TimeBucket`]).
    pub time_bucket_id: i64,
    /// Raw bytes across all miners.
    pub content_size_bytes: u64,
    /// Sum of bytes times each contributing miner's credibility.
    pub adj_content_size_bytes: u64,
}
