//! Index statistics.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db::{manifest::Manifest, meta};
use crate::knowledge::store;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub files: u64,
    pub chunks: u64,
    pub chunks_by_type: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_accessed: Option<AccessExtreme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_accessed: Option<AccessExtreme>,
    pub never_accessed: u64,
    pub db_size_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct AccessExtreme {
    pub path: String,
    pub access_count: u32,
}

/// Aggregate file/chunk counts, access extremes, and index freshness.
pub fn knowledge_stats(conn: &Connection, root: &Path) -> Result<StatsResponse> {
    let files = store::count_files(conn)?;
    let chunks = store::count_chunks(conn)?;
    let chunks_by_type = count_by_type(conn)?;

    let most_accessed = access_extreme(conn, "DESC")?;
    let least_accessed = access_extreme(conn, "ASC")?;
    let never_accessed: i64 = conn.query_row(
        "SELECT COUNT(*) FROM files WHERE last_accessed IS NULL",
        [],
        |row| row.get(0),
    )?;

    let manifest = Manifest::load(root)?;
    let db_size_bytes = std::fs::metadata(crate::db::db_path(root))
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        files,
        chunks,
        chunks_by_type,
        last_indexed: manifest.last_indexed,
        model_id: meta::get_model_id(conn)?,
        most_accessed,
        least_accessed,
        never_accessed: never_accessed as u64,
        db_size_bytes,
    })
}

fn count_by_type(conn: &Connection) -> Result<BTreeMap<String, u64>> {
    let mut map = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT chunk_type, COUNT(*) FROM chunks GROUP BY chunk_type")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (chunk_type, count) in rows {
        map.insert(chunk_type, count as u64);
    }
    Ok(map)
}

fn access_extreme(conn: &Connection, order: &str) -> Result<Option<AccessExtreme>> {
    let sql = format!(
        "SELECT path, access_count FROM files ORDER BY access_count {order}, path LIMIT 1"
    );
    let extreme = conn
        .query_row(&sql, [], |row| {
            Ok(AccessExtreme {
                path: row.get(0)?,
                access_count: row.get(1)?,
            })
        })
        .optional()?;
    Ok(extreme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::chunker;
    use crate::knowledge::store::ChunkWithVector;

    fn insert(conn: &mut Connection, name: &str, text: &str) -> String {
        let path = format!("knowledge/{name}.md");
        let chunks: Vec<ChunkWithVector> = chunker::chunk_file(&path, text)
            .chunks
            .into_iter()
            .map(|chunk| ChunkWithVector {
                chunk,
                vector: vec![0.0; crate::embedding::EMBEDDING_DIM],
            })
            .collect();
        store::upsert_file(conn, &path, "hash", 5, &chunks).unwrap();
        path
    }

    #[test]
    fn empty_index_stats() {
        let conn = crate::db::open_memory_database().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let stats = knowledge_stats(&conn, dir.path()).unwrap();
        assert_eq!(stats.files, 0);
        assert_eq!(stats.chunks, 0);
        assert!(stats.most_accessed.is_none());
        assert!(stats.last_indexed.is_none());
    }

    #[test]
    fn stats_report_counts_and_extremes() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let hot = insert(&mut conn, "hot", "## A\n\nAlpha.\n");
        let _cold = insert(&mut conn, "cold", "Plain text note.");
        store::touch(&conn, &[hot.as_str()]).unwrap();
        store::touch(&conn, &[hot.as_str()]).unwrap();

        let stats = knowledge_stats(&conn, dir.path()).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.chunks_by_type.get("section").copied(), Some(1));
        assert_eq!(stats.chunks_by_type.get("full").copied(), Some(1));
        assert_eq!(stats.most_accessed.as_ref().unwrap().path, hot);
        assert_eq!(stats.most_accessed.as_ref().unwrap().access_count, 2);
        assert_eq!(stats.least_accessed.as_ref().unwrap().access_count, 0);
        assert_eq!(stats.never_accessed, 1);
    }
}
