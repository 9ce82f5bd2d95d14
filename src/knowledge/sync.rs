//! Incremental synchronization between the knowledge tree and the index.
//!
//! The manifest (relative path → content hash) is the only freshness
//! mechanism: no watchers, no background threads. Every sync re-hashes the
//! discovered files, removes what vanished, re-indexes what changed, and
//! persists the manifest last — so the manifest can only ever lag the
//! store, and a lag heals on the next sync by re-hashing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db::manifest::Manifest;
use crate::db::meta;
use crate::embedding::EmbeddingProvider;
use crate::knowledge::chunker;
use crate::knowledge::classify;
use crate::knowledge::normalize;
use crate::knowledge::store::{self, ChunkWithVector};

/// Directories never descended into during discovery.
pub const SKIP_DIRS: [&str; 5] = ["node_modules", ".git", "dist", "build", ".memory-forge"];

/// What one sync pass did.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Relative paths indexed or re-indexed this pass.
    pub indexed: Vec<String>,
    /// Relative paths removed from the index this pass.
    pub removed: Vec<String>,
    /// Discovered files that were already current.
    pub unchanged: usize,
    /// Whether a model swap forced a full clear-and-rebuild.
    pub model_changed: bool,
}

impl SyncReport {
    pub fn did_work(&self) -> bool {
        !self.indexed.is_empty() || !self.removed.is_empty() || self.model_changed
    }
}

/// Explicit full pass: reconcile the store and manifest with the
/// knowledge tree. Removals are applied before insertions so a
/// delete-then-recreate of the same path converges on the new content.
pub fn sync_project(
    conn: &mut rusqlite::Connection,
    provider: &dyn EmbeddingProvider,
    root: &Path,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    // Model consistency gate: vectors from different models never mix.
    let stored_model = meta::get_model_id(conn)?;
    if let Some(stored) = &stored_model {
        if stored != provider.model_id() {
            info!(
                from = %stored,
                to = %provider.model_id(),
                "embedding model changed — clearing index for full rebuild"
            );
            store::clear(conn)?;
            Manifest::delete(root)?;
            report.model_changed = true;
        }
    }

    let mut manifest = Manifest::load(root)?;
    let discovered = discover(root);

    // Hash every discovered file; unreadable files are skipped and left
    // untouched in both the store and the manifest.
    let mut current: BTreeMap<String, (String, String)> = BTreeMap::new();
    let mut unreadable = 0usize;
    for (rel, abs) in &discovered {
        match std::fs::read_to_string(abs) {
            Ok(raw) => {
                let text = normalize::normalize(&raw);
                let hash = normalize::content_hash(&raw);
                current.insert(rel.clone(), (hash, text));
            }
            Err(e) => {
                warn!(path = %rel, error = %e, "skipping unreadable file");
                unreadable += 1;
            }
        }
    }

    // Removals first.
    let mut gone: Vec<String> = manifest
        .files
        .keys()
        .cloned()
        .chain(store::indexed_paths(conn)?)
        .filter(|p| !current.contains_key(p))
        .collect();
    gone.sort();
    gone.dedup();
    for path in gone {
        store::remove_file(conn, &path)?;
        manifest.files.remove(&path);
        info!(path = %path, "removed from index");
        report.removed.push(path);
    }

    // Then insertions and updates.
    for (rel, (hash, text)) in &current {
        if manifest.files.get(rel) == Some(hash) {
            report.unchanged += 1;
            continue;
        }

        let chunked = chunker::chunk_file(rel, text);
        let importance = chunked.importance.unwrap_or(5);

        let contents: Vec<&str> = chunked.chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = provider
            .embed_batch(&contents)
            .with_context(|| format!("embedding failed for {rel}"))?;

        let with_vectors: Vec<ChunkWithVector> = chunked
            .chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkWithVector { chunk, vector })
            .collect();

        store::upsert_file(conn, rel, hash, importance, &with_vectors)?;
        manifest.files.insert(rel.clone(), hash.clone());
        info!(path = %rel, chunks = with_vectors.len(), "indexed");
        report.indexed.push(rel.clone());
    }

    // Persist the manifest only when something happened, so an unchanged
    // corpus observably performs zero writes (lastIndexed stays put).
    if report.did_work() || !Manifest::exists(root) {
        manifest.last_indexed = Some(chrono::Utc::now().to_rfc3339());
        manifest.save(root)?;
    }
    if report.model_changed || stored_model.is_none() {
        meta::set_model_id(conn, provider.model_id())?;
    }

    debug!(
        indexed = report.indexed.len(),
        removed = report.removed.len(),
        unchanged = report.unchanged,
        unreadable,
        "sync complete"
    );
    Ok(report)
}

/// Fast path used before every search. Same machinery as [`sync_project`];
/// returns whether any work was done.
pub fn ensure_index_fresh(
    conn: &mut rusqlite::Connection,
    provider: &dyn EmbeddingProvider,
    root: &Path,
) -> Result<bool> {
    Ok(sync_project(conn, provider, root)?.did_work())
}

/// Clear the store and manifest, then rebuild from scratch.
pub fn force_reindex(
    conn: &mut rusqlite::Connection,
    provider: &dyn EmbeddingProvider,
    root: &Path,
) -> Result<SyncReport> {
    store::clear(conn)?;
    Manifest::delete(root)?;
    info!("index cleared for forced rebuild");
    sync_project(conn, provider, root)
}

/// Walk `<root>/knowledge/` and return `(relative, absolute)` pairs for
/// every indexable file. A missing knowledge directory yields an empty
/// set — sync still succeeds and prunes the index.
pub fn discover(root: &Path) -> Vec<(String, PathBuf)> {
    let knowledge_root = root.join(classify::KNOWLEDGE_DIR);
    if !knowledge_root.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(&knowledge_root)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIP_DIRS.contains(&name)))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = classify::to_relative(root, entry.path()) else {
            continue;
        };
        if classify::is_indexable(&rel) {
            files.push((rel, entry.path().to_path_buf()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_finds_only_indexable_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("knowledge/deep")).unwrap();
        std::fs::create_dir_all(root.join("knowledge/node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join(".claude/skills")).unwrap();
        std::fs::write(root.join("knowledge/a.md"), "alpha").unwrap();
        std::fs::write(root.join("knowledge/deep/b.md"), "beta").unwrap();
        std::fs::write(root.join("knowledge/deep/image.png"), "png").unwrap();
        std::fs::write(root.join("knowledge/node_modules/pkg/readme.md"), "dep").unwrap();
        std::fs::write(root.join("knowledge/CLAUDE.md"), "autoload").unwrap();
        std::fs::write(root.join("CLAUDE.md"), "autoload").unwrap();
        std::fs::write(root.join(".claude/skills/x.md"), "skill").unwrap();

        let found: Vec<String> = discover(root).into_iter().map(|(rel, _)| rel).collect();
        assert_eq!(found, vec!["knowledge/a.md", "knowledge/deep/b.md"]);
    }

    #[test]
    fn discover_missing_knowledge_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).is_empty());
    }
}
