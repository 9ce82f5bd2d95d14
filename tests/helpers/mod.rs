#![allow(dead_code)]

use anyhow::Result;
use memory_forge::db;
use memory_forge::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Deterministic bag-of-words embedder for tests.
///
/// Each lowercased alphanumeric token hashes (FNV-1a) to a dimension;
/// shared vocabulary between two texts yields high cosine similarity.
/// This exploits the engine's embedder seam — everything downstream of
/// the provider behaves exactly as it does with the neural model.
pub struct MockEmbedder {
    model: String,
}

impl MockEmbedder {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new("mock-embedder-v1")
    }
}

impl EmbeddingProvider for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % EMBEDDING_DIM as u64) as usize] += 1.0;
        }

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        } else {
            v[0] = 1.0;
        }
        Ok(v)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// A temp project with an empty `knowledge/` directory.
pub fn test_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("knowledge")).unwrap();
    dir
}

/// Fresh in-memory index database with the schema applied.
pub fn test_conn() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    conn
}

/// Write a file under the project root, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Remove a file under the project root.
pub fn remove_file(root: &Path, rel: &str) {
    std::fs::remove_file(root.join(rel)).unwrap();
}
