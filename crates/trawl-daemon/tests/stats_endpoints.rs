// crates/trawl-daemon/tests/stats_endpoints.rs
//
// GET /labels/{source} and GET /ages/{source} against a real SQLite index
// in a temp directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rusqlite::{params, Connection};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use trawl_core::error::TrawlError;
use trawl_core::metagraph::Metagraph;
use trawl_core::traits::{LivenessProbe, MembershipView};
use trawl_p2p::DendriteConnector;
use trawl_rpc::{build_router, ContextHandle, QueryConfig, ServiceContext};
use trawl_store::schema::WRITER_SCHEMA_SQL;
use trawl_store::{SqliteStatsStore, StatsStoreOptions};

struct EmptyGraph;

#[async_trait]
impl MembershipView for EmptyGraph {
    async fn snapshot(&self) -> Result<Arc<Metagraph>, TrawlError> {
        Ok(Arc::new(Metagraph::new(1, Vec::new())))
    }
}

struct Up;

impl LivenessProbe for Up {
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Seed an index: two miners with different credibility, data for X (2) and Reddit (1).
fn seed(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(WRITER_SCHEMA_SQL).unwrap();

    conn.execute(
        "INSERT INTO Miner (minerId, hotkey, credibility) VALUES (1, 'hk1', 1.0), (2, 'hk2', 0.5)",
        [],
    )
    .unwrap();

    let rows: [(i64, i64, i64, Option<i64>, i64); 5] = [
        (1, 2, 480_000, Some(1), 1000),
        (2, 2, 480_000, Some(1), 1000),
        (1, 2, 480_010, Some(2), 300),
        (2, 2, 479_990, None, 50),
        (1, 1, 480_000, Some(3), 7000),
    ];
    for (miner, source, bucket, label, size) in rows {
        conn.execute(
            "INSERT INTO MinerIndex (minerId, source, timeBucketId, labelId, contentSizeBytes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![miner, source, bucket, label, size],
        )
        .unwrap();
    }

    let labels: [(i64, Option<&str>, i64, i64); 4] = [
        (2, Some("#tokio"), 300, 300),
        (2, Some("#rust"), 2000, 1500),
        (2, None, 50, 25),
        (1, Some("r/rust"), 7000, 7000),
    ];
    for (source, label, size, adj) in labels {
        conn.execute(
            "INSERT INTO APILabelSize (source, labelValue, contentSizeBytes, adjContentSizeBytes)
             VALUES (?1, ?2, ?3, ?4)",
            params![source, label, size, adj],
        )
        .unwrap();
    }
}

fn router_over(store: SqliteStatsStore) -> Router {
    let ctx = ServiceContext::new(
        0,
        Arc::new(EmptyGraph),
        Arc::new(Up),
        Arc::new(store),
        Arc::new(DendriteConnector::new(None, Duration::from_secs(1))),
        QueryConfig::default(),
    );
    build_router(ContextHandle::ready(ctx))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn seeded_router(dir: &TempDir) -> Router {
    let path = dir.path().join("stats.db");
    seed(&path);
    router_over(SqliteStatsStore::open(&path, StatsStoreOptions::default()).unwrap())
}

#[tokio::test]
async fn labels_sorted_by_adjusted_size() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(seeded_router(&dir), "/labels/x").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["label_value"], "#rust");
    assert_eq!(rows[0]["content_size_bytes"], 2000);
    assert_eq!(rows[0]["adj_content_size_bytes"], 1500);
    assert_eq!(rows[2]["label_value"], Value::Null);

    let adj: Vec<u64> = rows
        .iter()
        .map(|r| r["adj_content_size_bytes"].as_u64().unwrap())
        .collect();
    assert!(adj.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn ages_grouped_by_bucket_newest_first() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(seeded_router(&dir), "/ages/X").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    let buckets: Vec<i64> = rows.iter().map(|r| r["time_bucket_id"].as_i64().unwrap()).collect();
    assert_eq!(buckets, vec![480_010, 480_000, 479_990]);

    // Bucket 480000: 1000 @ 1.0 + 1000 @ 0.5.
    assert_eq!(rows[1]["content_size_bytes"], 2000);
    assert_eq!(rows[1]["adj_content_size_bytes"], 1500);
    // Bucket 479990: 50 @ 0.5.
    assert_eq!(rows[2]["adj_content_size_bytes"], 25);
}

#[tokio::test]
async fn source_is_case_insensitive_and_scoped() {
    let dir = TempDir::new().unwrap();
    let router = seeded_router(&dir);

    let (status, body) = get(router.clone(), "/labels/Reddit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["label_value"], "r/rust");

    let (status, body) = get(router, "/ages/youtube").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn unknown_source_is_400_on_both_routes() {
    let dir = TempDir::new().unwrap();
    let router = seeded_router(&dir);

    for uri in ["/labels/myspace", "/ages/myspace"] {
        let (status, body) = get(router.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Invalid source: myspace");
    }
}

#[tokio::test]
async fn fresh_index_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStatsStore::open(
        dir.path().join("fresh.db"),
        StatsStoreOptions {
            pool_size: 2,
            serialize_reads: false,
        },
    )
    .unwrap();
    let router = router_over(store);

    let (status, body) = get(router.clone(), "/labels/x").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));

    let (status, body) = get(router, "/ages/reddit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn real_valued_label_sizes_serve_as_whole_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stats.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(WRITER_SCHEMA_SQL).unwrap();
    conn.execute(
        "INSERT INTO APILabelSize (source, labelValue, contentSizeBytes, adjContentSizeBytes)
         VALUES (2, '#rust', 1000, 512.5)",
        [],
    )
    .unwrap();
    let router = router_over(SqliteStatsStore::open(&path, StatsStoreOptions::default()).unwrap());

    let (status, body) = get(router, "/labels/x").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["content_size_bytes"], 1000);
    assert_eq!(body[0]["adj_content_size_bytes"], 513);
}
