//! Semantic search — freshness check, cosine ranking, priority boost,
//! and access accounting.
//!
//! Every search begins with [`sync::ensure_index_fresh`], so a search can
//! never return stale data; the freshness pass completes fully before the
//! query is embedded. Ranking asks the vec0 table for as many neighbors
//! as there are chunks — an exact full scan, which the corpus size
//! (low thousands of chunks) comfortably affords.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::l2_to_cosine;
use crate::knowledge::store;
use crate::knowledge::sync;
use crate::knowledge::types::{Chunk, ChunkType, SourceType};

/// Over-fetch factor used when folding to unique files.
const UNIQUE_OVERFETCH: usize = 3;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f32,
    /// Restrict results to these source types; `None` means all.
    pub source_types: Option<Vec<SourceType>>,
    /// Fold results so each source file appears at most once.
    pub unique_files: bool,
    /// Include chunk content in the results (`false` returns provenance only).
    pub include_content: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.3,
            source_types: None,
            unique_files: false,
            include_content: true,
        }
    }
}

/// One search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub file_path: String,
    pub source_type: SourceType,
    pub chunk_type: ChunkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub priority: u8,
    /// Priority-adjusted cosine similarity.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Search the knowledge index. An empty corpus returns an empty result
/// set, not an error; a query-embedding failure is fatal to the call.
pub fn search_knowledge(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    root: &Path,
    query: &str,
    opts: &SearchOptions,
) -> Result<Vec<SearchHit>> {
    sync::ensure_index_fresh(conn, provider, root)?;

    let total = store::count_chunks(conn)?;
    if total == 0 {
        return Ok(Vec::new());
    }

    let query_vec = provider
        .embed(query)
        .context("failed to embed search query")?;

    let candidates = knn_all(conn, &query_vec, total)?;
    let chunk_ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
    let chunks = fetch_chunks(conn, &chunk_ids)?;

    let mut ranked: Vec<(Chunk, f64)> = Vec::new();
    for (id, distance) in &candidates {
        let Some(chunk) = chunks.get(id.as_str()) else {
            continue;
        };
        if let Some(filter) = &opts.source_types {
            if !filter.contains(&chunk.source_type) {
                continue;
            }
        }
        let adjusted = boosted(l2_to_cosine(*distance), chunk.priority);
        if adjusted < opts.threshold as f64 {
            continue;
        }
        ranked.push((chunk.clone(), adjusted));
    }

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let results = if opts.unique_files {
        ranked.truncate(opts.limit * UNIQUE_OVERFETCH);
        let folded = fold_unique(ranked);
        folded.into_iter().take(opts.limit).collect::<Vec<_>>()
    } else {
        ranked.truncate(opts.limit);
        ranked
    };

    let mut touched: Vec<&str> = results
        .iter()
        .map(|(c, _)| c.file_path.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    touched.sort();
    store::touch(conn, &touched)?;

    Ok(results
        .into_iter()
        .map(|(chunk, score)| SearchHit {
            chunk_id: chunk.id,
            file_path: chunk.file_path,
            source_type: chunk.source_type,
            chunk_type: chunk.chunk_type,
            heading: chunk.heading,
            priority: chunk.priority,
            score: score as f32,
            content: opts.include_content.then_some(chunk.content),
            metadata: chunk.metadata,
        })
        .collect())
}

/// Render hits as a plain-text context block suitable for direct
/// injection into an agent prompt.
pub fn format_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No relevant knowledge found.".to_string();
    }

    let mut out = String::new();
    for hit in hits {
        let provenance = match &hit.heading {
            Some(heading) => format!("{} — {heading}", hit.file_path),
            None => hit.file_path.clone(),
        };
        out.push_str(&format!("## {provenance} (score {:.2})\n", hit.score));
        if let Some(content) = &hit.content {
            out.push_str(content);
            out.push('\n');
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Bounded priority boost: at most +20% for priority-10 chunks, preserving
/// monotonicity in the underlying similarity.
fn boosted(cosine: f64, priority: u8) -> f64 {
    cosine * (1.0 + 0.2 * priority as f64 / 10.0)
}

/// Keep the top-scored chunk per source file, preserving rank order.
fn fold_unique(ranked: Vec<(Chunk, f64)>) -> Vec<(Chunk, f64)> {
    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter(|(chunk, _)| seen.insert(chunk.file_path.clone()))
        .collect()
}

/// Exact nearest-neighbor pass over every stored vector.
fn knn_all(conn: &Connection, query: &[f32], total: u64) -> Result<Vec<(String, f64)>> {
    let query_bytes = crate::knowledge::embedding_to_bytes(query);
    let mut stmt = conn.prepare(
        "SELECT id, distance FROM chunks_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![query_bytes, total as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Batch-fetch chunk rows by id.
fn fetch_chunks(conn: &Connection, ids: &[&str]) -> Result<HashMap<String, Chunk>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT id, file_path, source_type, chunk_type, content, heading, priority, metadata \
         FROM chunks WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(params.as_slice(), store::chunk_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = HashMap::new();
    for chunk in rows {
        map.insert(chunk.id.clone(), chunk);
    }
    Ok(map)
}
