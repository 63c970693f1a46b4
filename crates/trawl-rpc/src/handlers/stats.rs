// crates/trawl-rpc/src/handlers/stats.rs
//
// Statistics handlers: content size per label and per time bucket.

use trawl_core::error::TrawlError;
use trawl_core::source::DataSource;
use trawl_core::stats::{AgeSize, LabelSize};

use crate::context::ServiceContext;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Handle `GET /labels/{source}`: one record per label, largest adjusted size first.
pub async fn handle_label_sizes(
    ctx: &ServiceContext,
    source: &str,
) -> Result<Vec<LabelSize>, TrawlError> {
    let source: DataSource = source.parse()?;
    ctx.stats.label_sizes(source).await
}

// ---------------------------------------------------------------------------
// Ages
// ---------------------------------------------------------------------------

/// Handle `GET /ages/{source}`: one record per time bucket, newest first.
pub async fn handle_age_sizes(
    ctx: &ServiceContext,
    source: &str,
) -> Result<Vec<AgeSize>, TrawlError> {
    let source: DataSource = source.parse()?;
    ctx.stats.age_sizes(source).await
}
