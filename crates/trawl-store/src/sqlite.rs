// crates/trawl-store/src/sqlite.rs
//
// SqliteStatsStore: pooled, query-only access to the statistics index.
//
// The database belongs to the writer process and nothing here creates or
// alters tables. Each read runs on the blocking pool with one pooled
// connection. When `serialize_reads` is set, a single store-wide mutex is
// held across the whole read so at most one aggregate query touches the
// database at a time. Guard and connection are both RAII, so they are released on every
// exit path.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

use tokio::sync::Mutex;

use trawl_core::error::TrawlError;
use trawl_core::source::DataSource;
use trawl_core::stats::{AgeSize, LabelSize};
use trawl_core::traits::StatsRepository;

use crate::schema;

/// How long a reader waits on a writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning for [`SqliteStatsStore`].
#[derive(Debug, Clone)]
pub struct StatsStoreOptions {
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Hold one store-wide lock around every read.
    pub serialize_reads: bool,
}

impl Default for StatsStoreOptions {
    fn default() -> Self {
        Self {
            pool_size: 4,
            serialize_reads: true,
        }
    }
}

/// Statistics index reader implementing [`StatsRepository`].
#[derive(Clone)]
pub struct SqliteStatsStore {
    pool: Pool<SqliteConnectionManager>,
    read_guard: Option<Arc<Mutex<()>>>,
}

impl std::fmt::Debug for SqliteStatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStatsStore")
            .field("max_size", &self.pool.max_size())
            .field("serialize_reads", &self.read_guard.is_some())
            .finish()
    }
}

impl SqliteStatsStore {
    /// Open the statistics database at `path`.
    ///
    /// Builds a pool whose connections refuse writes. Tables the writer has
    /// not created yet are logged and read as empty.
    pub fn open(path: impl AsRef<Path>, options: StatsStoreOptions) -> Result<Self, TrawlError> {
        let path = path.as_ref();

        let manager = SqliteConnectionManager::file(path).with_init(|c| {
            c.busy_timeout(BUSY_TIMEOUT)?;
            c.execute_batch("PRAGMA query_only = ON;")
        });
        let pool = Pool::builder()
            .max_size(options.pool_size.max(1))
            .build(manager)
            .map_err(|e| {
                TrawlError::Storage(format!("Failed to open stats db at {}: {}", path.display(), e))
            })?;

        let conn = pool
            .get()
            .map_err(|e| TrawlError::Storage(format!("Failed to get stats connection: {}", e)))?;
        for tables in [schema::LABEL_TABLES, schema::AGE_TABLES] {
            let present = schema::tables_present(&conn, tables)
                .map_err(|e| TrawlError::Storage(format!("Failed to inspect stats db: {}", e)))?;
            if !present {
                tracing::warn!(
                    "Stats db at {} has no {:?} yet; those reads will be empty",
                    path.display(),
                    tables
                );
            }
        }
        drop(conn);

        tracing::info!(
            "Stats store opened at {} (pool size {}, serialize reads: {})",
            path.display(),
            options.pool_size.max(1),
            options.serialize_reads
        );

        Ok(Self {
            pool,
            read_guard: options.serialize_reads.then(|| Arc::new(Mutex::new(()))),
        })
    }

    /// Run one read on the blocking pool.
    async fn read<T, F>(&self, what: &'static str, query: F) -> Result<T, TrawlError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let guard = match &self.read_guard {
            Some(lock) => Some(lock.clone().lock_owned().await),
            None => None,
        };
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let conn = pool
                .get()
                .map_err(|e| TrawlError::Storage(format!("Failed to get stats connection: {}", e)))?;
            query(&conn).map_err(|e| TrawlError::Storage(format!("{} query failed: {}", what, e)))
        })
        .await
        .map_err(|e| TrawlError::Internal(format!("{} task failed: {}", what, e)))?
    }
}

/// Byte counts are never negative; clamp anything the writer got wrong.
fn bytes(value: i64) -> u64 {
    value.max(0) as u64
}

#[async_trait]
impl StatsRepository for SqliteStatsStore {
    async fn label_sizes(&self, source: DataSource) -> Result<Vec<LabelSize>, TrawlError> {
        self.read("label size", move |conn| {
            if !schema::tables_present(conn, schema::LABEL_TABLES)? {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(schema::LABEL_SIZES_SQL)?;
            let rows = stmt.query_map(params![source.id()], |row| {
                Ok(LabelSize {
                    label_value: row.get(0)?,
                    content_size_bytes: bytes(row.get(1)?),
                    adj_content_size_bytes: bytes(row.get(2)?),
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn age_sizes(&self, source: DataSource) -> Result<Vec<AgeSize>, TrawlError> {
        self.read("age size", move |conn| {
            if !schema::tables_present(conn, schema::AGE_TABLES)? {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(schema::AGE_SIZES_SQL)?;
            let rows = stmt.query_map(params![source.id()], |row| {
                Ok(AgeSize {
                    time_bucket_id: row.get(0)?,
                    content_size_bytes: bytes(row.get(1)?),
                    adj_content_size_bytes: bytes(row.get(2)?),
                })
            })?;
            rows.collect()
        })
        .await
    }
}
