//! Write and read path for the chunk store.
//!
//! [`upsert_file`] is the single write entry point: it replaces a file's
//! record, chunks, and vectors as one transaction, so a crash mid-upsert
//! leaves the prior state intact. The vec0 table does not participate in
//! foreign-key cascades, so vector rows are always deleted explicitly.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::embedding::EMBEDDING_DIM;
use crate::knowledge::classify;
use crate::knowledge::embedding_to_bytes;
use crate::knowledge::types::{Chunk, FileRecord, SourceType};

/// A chunk paired with its embedding, ready for persistence.
#[derive(Debug)]
pub struct ChunkWithVector {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Replace a file's record, chunks, and vectors in one transaction.
///
/// The path must be indexable — this is the referential chokepoint that
/// keeps autoload files out of the store no matter which caller writes.
pub fn upsert_file(
    conn: &mut Connection,
    path: &str,
    hash: &str,
    importance: u8,
    chunks: &[ChunkWithVector],
) -> Result<()> {
    anyhow::ensure!(
        classify::is_indexable(path),
        "refusing to index non-indexable path: {path}"
    );
    anyhow::ensure!(
        (1..=10).contains(&importance),
        "importance out of range: {importance}"
    );
    for cv in chunks {
        anyhow::ensure!(
            cv.vector.len() == EMBEDDING_DIM,
            "vector dimension mismatch for chunk {}: {} != {EMBEDDING_DIM}",
            cv.chunk.id,
            cv.vector.len()
        );
    }

    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;

    delete_file_rows(&tx, path)?;

    tx.execute(
        "INSERT INTO files (path, content_hash, importance, access_count, last_accessed, indexed_at) \
         VALUES (?1, ?2, ?3, 0, NULL, ?4)",
        params![path, hash, importance, now],
    )?;

    {
        let mut chunk_stmt = tx.prepare(
            "INSERT INTO chunks (id, file_path, source_type, chunk_type, content, heading, priority, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        let mut vec_stmt =
            tx.prepare("INSERT INTO chunks_vec (id, embedding) VALUES (?1, ?2)")?;

        for cv in chunks {
            let c = &cv.chunk;
            let metadata = c.metadata.as_ref().map(|m| m.to_string());
            chunk_stmt.execute(params![
                c.id,
                path,
                c.source_type.as_str(),
                c.chunk_type.as_str(),
                c.content,
                c.heading,
                c.priority,
                metadata,
            ])?;
            vec_stmt.execute(params![c.id, embedding_to_bytes(&cv.vector)])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Remove a file and everything attached to it. Returns `false` if the
/// path was not indexed.
pub fn remove_file(conn: &mut Connection, path: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    let existed: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM files WHERE path = ?1",
        params![path],
        |row| row.get(0),
    )?;
    delete_file_rows(&tx, path)?;
    tx.commit()?;
    Ok(existed)
}

/// Transaction-scoped cascade for one file. Shared with retention, which
/// deletes many files in a single transaction.
pub(crate) fn delete_file_rows(tx: &Transaction, path: &str) -> Result<()> {
    tx.execute(
        "DELETE FROM chunks_vec WHERE id IN (SELECT id FROM chunks WHERE file_path = ?1)",
        params![path],
    )?;
    tx.execute("DELETE FROM chunks WHERE file_path = ?1", params![path])?;
    tx.execute("DELETE FROM files WHERE path = ?1", params![path])?;
    Ok(())
}

/// All file records, ordered by path.
pub fn list_files(conn: &Connection) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(
        "SELECT path, content_hash, importance, access_count, last_accessed, indexed_at \
         FROM files ORDER BY path",
    )?;
    let rows = stmt
        .query_map([], file_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_file(conn: &Connection, path: &str) -> Result<Option<FileRecord>> {
    let record = conn
        .query_row(
            "SELECT path, content_hash, importance, access_count, last_accessed, indexed_at \
             FROM files WHERE path = ?1",
            params![path],
            file_from_row,
        )
        .optional()?;
    Ok(record)
}

/// The set of currently indexed paths.
pub fn indexed_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT path FROM files ORDER BY path")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All chunks, optionally filtered by source type, ordered by file then id.
pub fn list_chunks(
    conn: &Connection,
    source_types: Option<&[SourceType]>,
) -> Result<Vec<Chunk>> {
    let mut stmt = conn.prepare(
        "SELECT id, file_path, source_type, chunk_type, content, heading, priority, metadata \
         FROM chunks ORDER BY file_path, id",
    )?;
    let rows = stmt
        .query_map([], chunk_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match source_types {
        Some(filter) => rows
            .into_iter()
            .filter(|c| filter.contains(&c.source_type))
            .collect(),
        None => rows,
    })
}

/// Increment `access_count` and stamp `last_accessed` for the given paths.
/// Used by the searcher after every query that returns hits.
pub fn touch(conn: &Connection, paths: &[&str]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let now = chrono::Utc::now().to_rfc3339();
    let mut stmt = conn.prepare(
        "UPDATE files SET access_count = access_count + 1, last_accessed = ?1 WHERE path = ?2",
    )?;
    for path in paths {
        stmt.execute(params![now, path])?;
    }
    Ok(())
}

/// Drop all chunks, vectors, and file records (model change, explicit reset).
pub fn clear(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM chunks_vec", [])?;
    tx.execute("DELETE FROM chunks", [])?;
    tx.execute("DELETE FROM files", [])?;
    crate::db::meta::clear_model_id(&tx)?;
    tx.commit()?;
    Ok(())
}

pub fn count_files(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
    Ok(count as u64)
}

pub fn count_chunks(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
    Ok(count as u64)
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn file_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        content_hash: row.get(1)?,
        importance: row.get(2)?,
        access_count: row.get(3)?,
        last_accessed: row.get(4)?,
        indexed_at: row.get(5)?,
    })
}

pub(crate) fn chunk_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
    let source_type: String = row.get(2)?;
    let chunk_type: String = row.get(3)?;
    let metadata: Option<String> = row.get(7)?;
    Ok(Chunk {
        id: row.get(0)?,
        file_path: row.get(1)?,
        source_type: source_type.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        chunk_type: chunk_type.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        content: row.get(4)?,
        heading: row.get(5)?,
        priority: row.get(6)?,
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
    })
}
