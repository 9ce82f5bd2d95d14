//! CLI `index` and `sync` commands — reconcile the index with the
//! knowledge tree.

use anyhow::Result;
use std::path::Path;

use crate::config::ForgeConfig;
use crate::embedding::LazyEmbedder;
use crate::knowledge::sync::{self, SyncReport};

/// Run a sync pass; with `force`, clear and rebuild first.
pub fn index(config: &ForgeConfig, root: &Path, force: bool) -> Result<()> {
    let mut conn = crate::db::open_database(root)?;
    let embedder = LazyEmbedder::new(config.embedding.clone());
    let provider = embedder.get()?;

    let report = if force {
        sync::force_reindex(&mut conn, provider.as_ref(), root)?
    } else {
        sync::sync_project(&mut conn, provider.as_ref(), root)?
    };

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &SyncReport) {
    if report.model_changed {
        println!("Embedding model changed — index was rebuilt from scratch.");
    }
    if !report.did_work() {
        println!("Index already up to date ({} files unchanged).", report.unchanged);
        return;
    }
    for path in &report.indexed {
        println!("  indexed  {path}");
    }
    for path in &report.removed {
        println!("  removed  {path}");
    }
    println!(
        "Sync complete: {} indexed, {} removed, {} unchanged.",
        report.indexed.len(),
        report.removed.len(),
        report.unchanged
    );
}
