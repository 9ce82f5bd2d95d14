//! Importance-protected forgetting.
//!
//! Retention bounds the derived index, never the source files: stale file
//! records and their chunks are deleted in one transaction while the
//! markdown tree is left untouched. Importance is the only human-authored
//! signal that survives memory pressure — files at or above the
//! protection threshold are never deleted, whatever the caps say.
//!
//! Manifest entries for forgotten files are deliberately kept: the
//! manifest records "seen at this hash", so an unchanged forgotten file
//! stays forgotten across syncs, while editing it changes the hash and
//! legitimately re-indexes it.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::knowledge::store;
use crate::knowledge::types::FileRecord;

/// Bounds for one forgetting pass. At least one of `max_files` /
/// `max_age_days` must be set.
#[derive(Debug, Clone, Default)]
pub struct ForgetConfig {
    /// Cap on retained files. Protected files are exempt from deletion and
    /// counted against the cap; the best `max_files − protected` candidates
    /// survive.
    pub max_files: Option<usize>,
    /// Files not accessed within this many days (or never accessed) are stale.
    pub max_age_days: Option<u32>,
    /// Files with importance at or above this are never deleted.
    /// `None` uses the default of 8.
    pub protect_importance: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct ForgetReport {
    /// Relative paths deleted (or that would be deleted under `dry_run`).
    pub removed: Vec<String>,
    /// Number of files exempt via importance.
    pub protected: usize,
    /// Total files examined.
    pub examined: usize,
    pub dry_run: bool,
}

/// Remove stale files from the index under the configured caps.
pub fn forget_stale(
    conn: &mut Connection,
    config: &ForgetConfig,
    dry_run: bool,
) -> Result<ForgetReport> {
    if config.max_files.is_none() && config.max_age_days.is_none() {
        bail!("retention requires at least one of max_files or max_age_days");
    }
    let protect = config.protect_importance.unwrap_or(8);

    let files = store::list_files(conn)?;
    let examined = files.len();

    let (protected, candidates): (Vec<FileRecord>, Vec<FileRecord>) =
        files.into_iter().partition(|f| f.importance >= protect);

    let mut stale: Vec<String> = Vec::new();

    if let Some(max_age_days) = config.max_age_days {
        let cutoff =
            (chrono::Utc::now() - chrono::Duration::days(max_age_days as i64)).to_rfc3339();
        for file in &candidates {
            let is_stale = match &file.last_accessed {
                Some(accessed) => *accessed < cutoff,
                None => true,
            };
            if is_stale {
                stale.push(file.path.clone());
            }
        }
    }

    if let Some(max_files) = config.max_files {
        let keep = max_files.saturating_sub(protected.len());
        let mut ordered = candidates.clone();
        // Survivors are the most important, then most used, then most
        // recently accessed; never-accessed files sort last.
        ordered.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then(b.access_count.cmp(&a.access_count))
                .then(b.last_accessed.cmp(&a.last_accessed))
        });
        for file in ordered.into_iter().skip(keep) {
            stale.push(file.path);
        }
    }

    stale.sort();
    stale.dedup();

    if !dry_run && !stale.is_empty() {
        let tx = conn.transaction()?;
        for path in &stale {
            store::delete_file_rows(&tx, path)?;
        }
        tx.commit()?;
        info!(removed = stale.len(), protected = protected.len(), "retention pass complete");
    }

    Ok(ForgetReport {
        removed: stale,
        protected: protected.len(),
        examined,
        dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::chunker;
    use crate::knowledge::store::ChunkWithVector;

    fn test_db() -> Connection {
        crate::db::open_memory_database().unwrap()
    }

    fn insert(conn: &mut Connection, name: &str, importance: u8) -> String {
        let path = format!("knowledge/{name}.md");
        let chunks: Vec<ChunkWithVector> = chunker::chunk_file(&path, "Some knowledge content.")
            .chunks
            .into_iter()
            .map(|chunk| ChunkWithVector {
                chunk,
                vector: vec![0.0; crate::embedding::EMBEDDING_DIM],
            })
            .collect();
        store::upsert_file(conn, &path, "hash", importance, &chunks).unwrap();
        path
    }

    fn remaining(conn: &Connection) -> Vec<String> {
        store::indexed_paths(conn).unwrap()
    }

    #[test]
    fn no_bounds_is_refused() {
        let mut conn = test_db();
        let err = forget_stale(&mut conn, &ForgetConfig::default(), false).unwrap_err();
        assert!(err.to_string().contains("max_files or max_age_days"));
    }

    #[test]
    fn max_files_keeps_protected_and_best_candidates() {
        let mut conn = test_db();
        let p10 = insert(&mut conn, "canonical", 10);
        let p8 = insert(&mut conn, "reference", 8);
        let p5 = insert(&mut conn, "useful", 5);
        let p3 = insert(&mut conn, "minor", 3);
        let p2 = insert(&mut conn, "trivial", 2);

        let config = ForgetConfig {
            max_files: Some(3),
            ..ForgetConfig::default()
        };
        let report = forget_stale(&mut conn, &config, false).unwrap();

        assert_eq!(report.protected, 2);
        assert_eq!(report.examined, 5);
        let mut removed = report.removed.clone();
        removed.sort();
        let mut expected = vec![p3.clone(), p2.clone()];
        expected.sort();
        assert_eq!(removed, expected);

        let kept = remaining(&conn);
        assert!(kept.contains(&p10));
        assert!(kept.contains(&p8));
        assert!(kept.contains(&p5));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn protected_files_survive_any_config() {
        let mut conn = test_db();
        let p10 = insert(&mut conn, "vital", 10);
        let p8 = insert(&mut conn, "important", 8);
        insert(&mut conn, "ordinary", 5);

        let config = ForgetConfig {
            max_files: Some(0),
            max_age_days: Some(0),
            protect_importance: None,
        };
        forget_stale(&mut conn, &config, false).unwrap();

        let kept = remaining(&conn);
        assert!(kept.contains(&p10));
        assert!(kept.contains(&p8));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn max_age_marks_untouched_files_stale() {
        let mut conn = test_db();
        let touched = insert(&mut conn, "recent", 5);
        let untouched = insert(&mut conn, "dormant", 5);
        store::touch(&conn, &[touched.as_str()]).unwrap();

        let config = ForgetConfig {
            max_age_days: Some(30),
            ..ForgetConfig::default()
        };
        let report = forget_stale(&mut conn, &config, false).unwrap();

        // The never-accessed file is stale; the just-touched one is not.
        assert_eq!(report.removed, vec![untouched]);
        assert_eq!(remaining(&conn), vec![touched]);
    }

    #[test]
    fn count_selection_prefers_most_used_on_importance_tie() {
        let mut conn = test_db();
        let used = insert(&mut conn, "used", 5);
        let unused = insert(&mut conn, "unused", 5);
        store::touch(&conn, &[used.as_str()]).unwrap();

        let config = ForgetConfig {
            max_files: Some(1),
            ..ForgetConfig::default()
        };
        let report = forget_stale(&mut conn, &config, false).unwrap();

        assert_eq!(report.removed, vec![unused]);
        assert_eq!(remaining(&conn), vec![used]);
    }

    #[test]
    fn dry_run_deletes_nothing() {
        let mut conn = test_db();
        insert(&mut conn, "a", 2);
        insert(&mut conn, "b", 3);

        let config = ForgetConfig {
            max_files: Some(0),
            ..ForgetConfig::default()
        };
        let report = forget_stale(&mut conn, &config, true).unwrap();

        assert_eq!(report.removed.len(), 2);
        assert!(report.dry_run);
        assert_eq!(remaining(&conn).len(), 2);
    }

    #[test]
    fn deletion_cascades_to_chunks_and_vectors() {
        let mut conn = test_db();
        insert(&mut conn, "gone", 2);

        let config = ForgetConfig {
            max_files: Some(0),
            ..ForgetConfig::default()
        };
        forget_stale(&mut conn, &config, false).unwrap();

        assert_eq!(store::count_chunks(&conn).unwrap(), 0);
        let vec_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks_vec", [], |r| r.get(0))
            .unwrap();
        assert_eq!(vec_count, 0);
    }
}
