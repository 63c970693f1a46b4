// crates/trawl-rpc/src/handlers/query.rs
//
// On-demand query handler: select miners, dispatch, merge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use trawl_core::error::TrawlError;
use trawl_core::query::{OnDemandRequest, QueryResultItem};
use trawl_core::source::DataSource;

use crate::context::ServiceContext;
use crate::merge;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

fn default_limit() -> u32 {
    100
}

/// Body of `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Source name, case-insensitive ("x", "REDDIT", ...).
    pub source: String,
    #[serde(default)]
    pub usernames: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// RFC 3339 timestamp or plain `YYYY-MM-DD` (midnight UTC).
    #[serde(default, deserialize_with = "deserialize_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl QueryRequest {
    /// Parse the source and check limits, producing the wire request.
    pub fn into_on_demand(self, max_limit: u32) -> Result<OnDemandRequest, TrawlError> {
        let request = OnDemandRequest {
            source: self.source.parse::<DataSource>()?,
            usernames: self.usernames,
            keywords: self.keywords,
            start_date: self.start_date,
            end_date: self.end_date,
            limit: self.limit,
        };
        request.validate(max_limit)?;
        Ok(request)
    }
}

/// Counters describing how a query was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMeta {
    /// Miners that answered, including those with nothing to return.
    pub total_responses: usize,
    /// Distinct items before truncation to `limit`.
    pub unique_items: usize,
    /// Miners the query was sent to.
    pub miners_queried: usize,
    /// Size of the qualified set.
    pub qualified_miners: usize,
    /// Size of the eligible set.
    pub total_miners: usize,
}

/// Body of a successful `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Always "success".
    pub status: String,
    pub data: Vec<QueryResultItem>,
    pub meta: QueryMeta,
}

/// Handle a query.
///
/// Fails with `ServiceUnavailable` when no miner qualifies, whatever pool
/// the dispatch draws from. Miner failures never fail the request.
pub async fn handle_query(
    ctx: &ServiceContext,
    request: QueryRequest,
) -> Result<QueryResponse, TrawlError> {
    let request = request.into_on_demand(ctx.query.max_limit)?;
    let selection = ctx.selection().await?;

    if selection.qualified.is_empty() {
        return Err(TrawlError::ServiceUnavailable(
            "No qualified miners available".to_string(),
        ));
    }

    let targets = selection.pick(
        ctx.query.dispatch_pool,
        ctx.query.fanout,
        &mut rand::thread_rng(),
    );

    tracing::debug!(
        "Dispatching {} query to miners {:?}",
        request.source,
        targets.iter().map(|n| n.uid).collect::<Vec<_>>()
    );

    let outcome = ctx.dispatcher.dispatch(&targets, &request).await?;
    let merged = merge::merge(outcome.payloads, request.limit as usize);

    tracing::info!(
        "Query on {} answered by {}/{} miners: {} unique items, returning {}",
        request.source,
        merged.total_responses,
        outcome.attempted,
        merged.unique_items,
        merged.data.len()
    );

    Ok(QueryResponse {
        status: "success".to_string(),
        data: merged.data,
        meta: QueryMeta {
            total_responses: merged.total_responses,
            unique_items: merged.unique_items,
            miners_queried: outcome.attempted,
            qualified_miners: selection.qualified.len(),
            total_miners: selection.eligible.len(),
        },
    })
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_date(&s).map_err(serde::de::Error::custom))
        .transpose()
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(json: &str) -> QueryRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_apply() {
        let req = request(r#"{"source": "x"}"#);
        assert_eq!(req.limit, 100);
        assert!(req.usernames.is_empty());
        assert!(req.keywords.is_empty());
        assert!(req.start_date.is_none());
    }

    #[test]
    fn accepts_plain_dates_and_timestamps() {
        let req = request(
            r#"{"source": "reddit", "start_date": "2024-03-01", "end_date": "2024-03-02T12:30:00+02:00"}"#,
        );
        assert_eq!(req.start_date, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(req.end_date, Some(Utc.with_ymd_and_hms(2024, 3, 2, 10, 30, 0).unwrap()));
    }

    #[test]
    fn rejects_garbage_dates() {
        let parsed: Result<QueryRequest, _> =
            serde_json::from_str(r#"{"source": "x", "start_date": "yesterday"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn into_on_demand_parses_source_case_insensitively() {
        let wire = request(r#"{"source": "YouTube", "keywords": ["rust"], "limit": 5}"#)
            .into_on_demand(1000)
            .unwrap();
        assert_eq!(wire.source, DataSource::Youtube);
        assert_eq!(wire.keywords, vec!["rust".to_string()]);
        assert_eq!(wire.limit, 5);
    }

    #[test]
    fn into_on_demand_rejects_bad_input() {
        let unknown = request(r#"{"source": "myspace"}"#).into_on_demand(1000);
        assert!(matches!(unknown, Err(TrawlError::InvalidArgument(_))));

        let zero = request(r#"{"source": "x", "limit": 0}"#).into_on_demand(1000);
        assert!(matches!(zero, Err(TrawlError::InvalidArgument(_))));

        let too_big = request(r#"{"source": "x", "limit": 1001}"#).into_on_demand(1000);
        assert!(matches!(too_big, Err(TrawlError::InvalidArgument(_))));

        let backwards =
            request(r#"{"source": "x", "start_date": "2024-03-02", "end_date": "2024-03-01"}"#)
                .into_on_demand(1000);
        assert!(matches!(backwards, Err(TrawlError::InvalidArgument(_))));
    }
}
