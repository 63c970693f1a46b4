// crates/trawl-store/src/schema.rs
//
// Table layout of the statistics index, as laid down by the validator
// storage that populates it:
//
//   Miner         one row per miner, with its current credibility
//   MinerIndex    per-miner content totals by (source, time bucket, label)
//   APILabelSize  precomputed per-label totals served by /labels
//
// The writer owns these tables; this crate never creates or alters them.
// A read against a table that does not exist yet answers with no rows.

use rusqlite::{params, Connection};

/// The writer's layout, restricted to the columns the reads use.
///
/// Used to seed fixtures. Production databases come from the writer.
pub const WRITER_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS Miner (
        minerId     INTEGER PRIMARY KEY,
        hotkey      TEXT NOT NULL UNIQUE,
        credibility FLOAT NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS MinerIndex (
        minerId          INTEGER NOT NULL,
        source           INTEGER NOT NULL,
        timeBucketId     INTEGER NOT NULL,
        labelId          INTEGER,
        contentSizeBytes INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS APILabelSize (
        source              INTEGER NOT NULL,
        labelValue          TEXT,
        contentSizeBytes    INTEGER NOT NULL,
        adjContentSizeBytes INTEGER NOT NULL
    );
"#;

/// Tables the label read needs.
pub const LABEL_TABLES: &[&str] = &["APILabelSize"];

/// Tables the age read needs.
pub const AGE_TABLES: &[&str] = &["Miner", "MinerIndex"];

/// Per-label totals for one source, largest adjusted size first.
///
/// Sizes are rounded to whole bytes; the writer may store them as REAL.
pub const LABEL_SIZES_SQL: &str = r#"
    SELECT
        labelValue,
        CAST(ROUND(contentSizeBytes) AS INTEGER) AS contentSizeBytes,
        CAST(ROUND(adjContentSizeBytes) AS INTEGER) AS adjContentSizeBytes
    FROM APILabelSize
    WHERE source = ?1
    ORDER BY adjContentSizeBytes DESC, labelValue ASC
"#;

/// Per-bucket totals for one source, newest bucket first.
///
/// The adjusted size weights each miner's bytes by its credibility.
pub const AGE_SIZES_SQL: &str = r#"
    SELECT
        timeBucketId,
        CAST(ROUND(SUM(contentSizeBytes)) AS INTEGER),
        CAST(ROUND(SUM(contentSizeBytes * credibility)) AS INTEGER)
    FROM Miner
    JOIN MinerIndex USING (minerId)
    WHERE source = ?1
    GROUP BY timeBucketId
    ORDER BY timeBucketId DESC
"#;

/// True when every table in `names` exists.
pub fn tables_present(conn: &Connection, names: &[&str]) -> rusqlite::Result<bool> {
    for name in names {
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_present_tracks_writer_layout() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!tables_present(&conn, LABEL_TABLES).unwrap());
        assert!(!tables_present(&conn, AGE_TABLES).unwrap());

        conn.execute_batch(WRITER_SCHEMA_SQL).unwrap();
        assert!(tables_present(&conn, LABEL_TABLES).unwrap());
        assert!(tables_present(&conn, AGE_TABLES).unwrap());
    }

    #[test]
    fn partial_layout_is_not_present() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE Miner (minerId INTEGER PRIMARY KEY, credibility FLOAT)")
            .unwrap();
        assert!(!tables_present(&conn, AGE_TABLES).unwrap());
    }

    #[test]
    fn read_queries_prepare_against_writer_layout() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(WRITER_SCHEMA_SQL).unwrap();
        conn.prepare(LABEL_SIZES_SQL).unwrap();
        conn.prepare(AGE_SIZES_SQL).unwrap();
    }
}
