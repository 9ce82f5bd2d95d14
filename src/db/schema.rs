//! SQL DDL for the index tables.
//!
//! Defines `files` (one row per indexed knowledge file), `chunks`, the
//! `chunks_vec` (vec0) vector table, and the `index_meta` key/value table.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema DDL for the plain tables.
const SCHEMA_SQL: &str = r#"
-- One row per indexed knowledge file. Paths are relative to the project
-- root, forward-slash separated, so a moved project keeps its index.
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    content_hash TEXT NOT NULL,
    importance INTEGER NOT NULL DEFAULT 5 CHECK(importance BETWEEN 1 AND 10),
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0),
    last_accessed TEXT,
    indexed_at TEXT NOT NULL
);

-- Retrievable units. claude-md/agents-md are legacy source types kept
-- readable for old databases; the current write path never produces them.
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
    source_type TEXT NOT NULL CHECK(source_type IN ('skill','knowledge','claude-md','agents-md')),
    chunk_type TEXT NOT NULL CHECK(chunk_type IN ('frontmatter','problem','trigger','solution','verification','section','full')),
    content TEXT NOT NULL,
    heading TEXT,
    priority INTEGER NOT NULL CHECK(priority BETWEEN 1 AND 10),
    metadata TEXT
);

CREATE INDEX IF NOT EXISTS idx_chunks_file ON chunks(file_path);
CREATE INDEX IF NOT EXISTS idx_chunks_source_type ON chunks(source_type);

-- Scalar index metadata: schema version and the embedding model id that
-- produced every stored vector.
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"files".to_string()));
        assert!(tables.contains(&"chunks".to_string()));
        assert!(tables.contains(&"index_meta".to_string()));

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn importance_range_is_enforced() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO files (path, content_hash, importance, indexed_at) \
             VALUES ('knowledge/a.md', 'abc', 11, '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
